use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    // Route the coordinate ingest handler is mounted on
    #[serde(default = "default_endpoint_path")]
    pub gps_endpoint_path: String,

    // Store collection every coordinate record is appended under
    #[serde(default = "default_collection_path")]
    pub gps_collection_path: String,

    #[serde(flatten)]
    pub firebase: FirebaseConfig,
}

/// Service account and database settings for the Realtime Database client.
///
/// The values are opaque here. Missing credentials are not rejected at
/// startup; they show up as write failures once a request needs a token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirebaseConfig {
    #[serde(default)]
    pub firebase_project_id: String,

    #[serde(default)]
    pub firebase_client_email: String,

    // PEM key as stored in the environment, newlines escaped as literal "\n"
    #[serde(default)]
    pub firebase_private_key: String,

    #[serde(default)]
    pub firebase_database_url: String,

    #[serde(default = "default_token_uri")]
    pub firebase_token_uri: String,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<Config>()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            gps_endpoint_path: default_endpoint_path(),
            gps_collection_path: default_collection_path(),
            firebase: FirebaseConfig {
                firebase_token_uri: default_token_uri(),
                ..Default::default()
            },
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_endpoint_path() -> String {
    "/api/gps".to_string()
}

fn default_collection_path() -> String {
    "gpsData".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}
