use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    #[error("Could not fetch playback credential: {0}")]
    CredentialFetch(String),

    #[error("Playback engine could not be loaded: {0}")]
    ScriptLoad(String),

    #[error("Playback engine failed to initialize: {0}")]
    EngineInitialization(String),

    #[error("Playback engine rejected the credential: {0}")]
    EngineAuthentication(String),

    #[error("Account cannot use the playback engine: {0}")]
    EngineAccount(String),

    #[error("Playback device went offline: {0}")]
    DeviceOffline(String),

    #[error("Could not connect to the playback engine: {0}")]
    Connection(String),

    #[error("Transport command failed: {0}")]
    Command(String),

    #[error("Could not load tracks: {0}")]
    CatalogFetch(String),

    #[error("Track list is not in the expected format: {0}")]
    CatalogFormat(String),

    #[error("Playback engine is not ready")]
    NotReady,
}
