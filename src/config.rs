use {
    crate::{
        backend::{Backend, FileBackend, MemoryBackend, RedisBackend, DEFAULT_REDIS_KEY},
        email::Email,
        error::Error,
    },
    clap::{Parser, ValueEnum},
    log::{info, warn},
    std::{path::PathBuf, sync::Arc, time::Duration},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Lost on restart
    Memory,
    /// JSON document on local disk
    File,
    /// JSON document in redis
    Redis,
}

/// Web server for invitation RSVPs
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "RSVP_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Where guests and RSVPs are kept
    #[arg(long, env = "RSVP_BACKEND", value_enum, default_value_t = BackendKind::File)]
    pub backend: BackendKind,

    /// Document path for the file backend
    #[arg(long, env = "RSVP_DATA_FILE", default_value = "rsvp-database.json")]
    pub data_file: PathBuf,

    /// Connection URL for the redis backend
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Key holding the document in redis
    #[arg(long, env = "RSVP_REDIS_KEY", default_value = DEFAULT_REDIS_KEY)]
    pub redis_key: String,

    /// Timeout for each redis call, in milliseconds
    #[arg(long, env = "RSVP_REDIS_TIMEOUT_MS", default_value_t = 2000)]
    pub redis_timeout_ms: u64,

    /// Sets the "from" email address for admin notifications
    #[arg(long, env = "RSVP_FROM")]
    pub from: Option<String>,

    /// Admin email address, receives a message on every RSVP
    #[arg(long = "admin", env = "RSVP_ADMINS", value_delimiter = ',')]
    pub admins: Vec<String>,

    /// Test mode, doesn't actually send emails
    #[arg(short, long)]
    pub test: bool,
}

impl Config {
    /// Picks the storage backend once, for the lifetime of the process
    pub fn open_backend(&self) -> Result<Arc<dyn Backend>, Error> {
        let backend: Arc<dyn Backend> = match self.backend {
            BackendKind::Memory => {
                warn!("Using in-memory storage, data is lost on restart");
                Arc::new(MemoryBackend::new())
            }
            BackendKind::File => {
                info!("Using file storage at {}", self.data_file.display());
                Arc::new(FileBackend::new(&self.data_file))
            }
            BackendKind::Redis => {
                let url = self.redis_url.as_deref().ok_or_else(|| {
                    Error::Config("--redis-url or REDIS_URL is required for redis".to_string())
                })?;
                info!("Using redis storage under key {}", self.redis_key);
                Arc::new(RedisBackend::new(
                    url,
                    &self.redis_key,
                    Duration::from_millis(self.redis_timeout_ms),
                )?)
            }
        };
        Ok(backend)
    }

    pub fn email(&self) -> Option<Email> {
        match &self.from {
            Some(from) if !self.admins.is_empty() => Some(Email::new(from, &self.admins, self.test)),
            Some(_) => {
                warn!("--from given without any --admin, notifications disabled");
                None
            }
            None => None,
        }
    }
}
