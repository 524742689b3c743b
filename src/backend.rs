//! Storage backends for the single `{guests, rsvps}` document.
//!
//! Every backend reads and writes the whole document at once. None of them
//! provide transactions; the store serializes its own read-modify-write
//! cycles.

use {
    crate::{
        error::{Error, StorageError},
        model::Database,
    },
    async_trait::async_trait,
    log::debug,
    redis::AsyncCommands,
    std::{
        io::{self, Write},
        path::{Path, PathBuf},
        time::Duration,
    },
    tempfile::NamedTempFile,
    tokio::{sync::RwLock, time::timeout},
};

pub static DEFAULT_REDIS_KEY: &str = "rsvp-database";

#[async_trait]
pub trait Backend: Send + Sync {
    async fn load(&self) -> Result<Database, Error>;
    async fn save(&self, db: &Database) -> Result<(), Error>;
    fn name(&self) -> &'static str;
}

/// Keeps the document for the lifetime of the process
#[derive(Default)]
pub struct MemoryBackend {
    db: RwLock<Database>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn load(&self) -> Result<Database, Error> {
        Ok(self.db.read().await.clone())
    }

    async fn save(&self, db: &Database) -> Result<(), Error> {
        *self.db.write().await = db.clone();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// JSON document on local disk, replaced atomically on every save
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

#[async_trait]
impl Backend for FileBackend {
    async fn load(&self) -> Result<Database, Error> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Database::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist yet, starting empty", self.path.display());
                Ok(Database::default())
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn save(&self, db: &Database) -> Result<(), Error> {
        let contents = serde_json::to_vec_pretty(db)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &contents))
            .await
            .map_err(|error| io::Error::new(io::ErrorKind::Other, error))??;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// JSON document stored as a string under one redis key
pub struct RedisBackend {
    client: redis::Client,
    key: String,
    timeout: Duration,
}

impl RedisBackend {
    pub fn new(url: &str, key: &str, timeout: Duration) -> Result<Self, Error> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            key: key.to_string(),
            timeout,
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn load(&self) -> Result<Database, Error> {
        let request = async {
            let mut conn = self.connection().await?;
            conn.get::<_, Option<String>>(&self.key).await
        };
        let raw = timeout(self.timeout, request)
            .await
            .map_err(|_| StorageError::Timeout(self.timeout))??;
        match raw {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Database::default()),
        }
    }

    async fn save(&self, db: &Database) -> Result<(), Error> {
        let raw = serde_json::to_string(db)?;
        let request = async {
            let mut conn = self.connection().await?;
            conn.set::<_, _, ()>(&self.key, raw).await
        };
        timeout(self.timeout, request)
            .await
            .map_err(|_| StorageError::Timeout(self.timeout))??;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
