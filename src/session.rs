//! Session management for the Telegram client
//!
//! Provides:
//! - File-based session locking to prevent parallel runs on one session
//! - Session file validation (the session must already be authorized)
//! - Client creation from the pooled sender

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use grammers_client::client::updates::UpdatesLike;
use grammers_client::Client;
use grammers_mtsender::SenderPool;
use grammers_session::storages::SqliteSession;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::{Error, Result};

/// Session lock guard that ensures exclusive access to the Telegram session.
pub struct SessionLock {
    lock_file: Option<File>,
    path: PathBuf,
}

impl SessionLock {
    /// Acquire an exclusive lock next to the session file.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::LockError(format!("Failed to open lock file: {}", e)))?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                lock_file: Some(lock_file),
                path: path.to_path_buf(),
            }),
            Err(_) => {
                eprintln!(
                    r#"
⚠️  ОШИБКА: Telegram сессия уже используется другим процессом!

Telegram требует последовательного выполнения операций.
Параллельное использование одной сессии приводит к конфликтам и блокировкам.

Дождитесь завершения другого процесса и попробуйте снова.
"#
                );
                Err(Error::SessionLocked)
            }
        }
    }

    /// Release the lock manually
    pub fn release(&mut self) {
        if let Some(ref file) = self.lock_file {
            let _ = file.unlock();
        }
        self.lock_file = None;
        let _ = std::fs::remove_file(&self.path);
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Check if the configured session file exists.
pub fn check_session_exists(config: &Config) -> Result<()> {
    let session_file = config.session_file();

    if !Path::new(&session_file).exists() {
        eprintln!(
            r#"
⚠️  ОШИБКА: Session файл '{}' не найден!

Скачивание работает только с уже авторизованной сессией.
Создайте и авторизуйте сессию отдельным скриптом входа и укажите
её имя в config.ini (секция [Access], ключ session).
"#,
            session_file
        );
        return Err(Error::SessionNotFound(session_file));
    }

    Ok(())
}

/// Load an existing session from file.
pub fn load_session(config: &Config) -> Result<Arc<SqliteSession>> {
    let session_file = config.session_file();
    let session = SqliteSession::open(&session_file)
        .map_err(|e| Error::SessionNotFound(format!("Failed to load session: {}", e)))?;
    Ok(Arc::new(session))
}

/// Holder for SenderPool components and Client
pub struct TelegramClient {
    pub client: Client,
    _updates: mpsc::UnboundedReceiver<UpdatesLike>,
    _runner_handle: tokio::task::JoinHandle<()>,
}

impl TelegramClient {
    /// Create a new TelegramClient from an already-authorized session.
    pub async fn connect(session: Arc<SqliteSession>, config: &Config) -> Result<Self> {
        let pool = SenderPool::new(session, config.access.api_id);

        // Create client from pool (need reference to whole pool)
        let client = Client::new(&pool);

        // Get handle and runner after client is created
        let SenderPool {
            runner,
            updates,
            handle: _,
        } = pool;

        // Spawn the runner in background
        let runner_handle = tokio::spawn(async move {
            runner.run().await;
        });

        let timeout = Duration::from_secs(config.client.timeout);
        let authorized = tokio::time::timeout(timeout, client.is_authorized())
            .await
            .map_err(|_| {
                Error::TelegramError(format!(
                    "connection timed out after {}s",
                    config.client.timeout
                ))
            })??;

        if !authorized {
            eprintln!(
                r#"
⚠️  ОШИБКА: Сессия '{}' не авторизована!

Выполните вход в Telegram отдельным скриптом входа
и повторите запуск.
"#,
                config.session_file()
            );
            return Err(Error::AuthorizationRequired);
        }

        Ok(Self {
            client,
            _updates: updates,
            _runner_handle: runner_handle,
        })
    }
}

// Implement Deref to allow using TelegramClient as &Client
impl std::ops::Deref for TelegramClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Validate, load and connect in one go.
pub async fn get_client(config: &Config) -> Result<TelegramClient> {
    check_session_exists(config)?;
    let session = load_session(config)?;
    TelegramClient::connect(session, config).await
}
