use std::collections::HashMap;

use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    Catalog,
    SessionInit,
}

/// Owns the app's background tasks so they can be cancelled on quit.
///
/// Keyed tasks replace (and abort) their predecessor. Transport commands are
/// never aborted mid-flight, they run to completion in `commands`.
#[derive(Default)]
pub struct TaskManager {
    tasks: HashMap<TaskKey, JoinHandle<()>>,
    commands: Vec<JoinHandle<()>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, key: TaskKey, task: JoinHandle<()>) {
        if let Some(handle) = self.tasks.insert(key, task) {
            handle.abort();
        }
    }

    pub fn spawn_command(&mut self, task: JoinHandle<()>) {
        self.commands.retain(|handle| !handle.is_finished());
        self.commands.push(task);
    }

    #[cfg(test)]
    fn is_running(&self, key: TaskKey) -> bool {
        self.tasks.get(&key).is_some_and(|handle| !handle.is_finished())
    }

    pub fn abort_all(&mut self) {
        for handle in self.tasks.values().chain(self.commands.iter()) {
            handle.abort();
        }
        self.tasks.clear();
        self.commands.clear();
    }
}
