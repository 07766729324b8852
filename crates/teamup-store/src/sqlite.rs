//! SQLite-backed user store.
//!
//! One row per user in `users`; every member of the three relationship sets
//! is a row in `user_links`. Saving a user rewrites its link rows inside a
//! transaction, and `save_all` wraps several users in a single transaction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, info, warn};

use crate::repository::UserRepository;
use crate::schema::SCHEMA_SQL;
use crate::types::{LinkKind, User};
use teamup_core::{observe_user_id, Error, Result, UserId};

const USER_COLUMNS: &str = "id, name, email, skills, password_hash";

/// SQLite store for users and their relationship sets.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteUserStore {
    /// Open or create the SQLite store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/teamup.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("teamup.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        if let Some(max_id) = store.max_id()? {
            observe_user_id(max_id);
        }

        info!(
            "SqliteUserStore initialized: {} users, path={}",
            store.count()?,
            store.db_path.display()
        );

        Ok(store)
    }

    /// Open an existing database file without creating anything.
    pub fn open_existing(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if !db_path.exists() {
            return Err(Error::NotFound(format!("database {}", db_path.display())));
        }
        let conn = Self::create_connection(db_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_error)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_error)?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    fn max_id(&self) -> Result<Option<UserId>> {
        let conn = self.conn.lock();
        let max_id = conn
            .query_row("SELECT MAX(id) FROM users", [], |row| row.get(0))
            .map_err(db_error)?;
        Ok(max_id)
    }

    // ---------------------------------------------------------------
    // Row mapping
    // ---------------------------------------------------------------

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User::new(
            row.get(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    }

    fn load_links(conn: &Connection, user: &mut User) -> Result<()> {
        let mut stmt = conn
            .prepare_cached("SELECT peer_id, kind FROM user_links WHERE user_id = ?1")
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![user.id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(db_error)?;

        for row in rows {
            let (peer_id, kind) = row.map_err(db_error)?;
            match LinkKind::parse(&kind) {
                Some(kind) => {
                    user.links_mut(kind).insert(peer_id);
                }
                None => warn!("Skipping unknown link kind '{}' for user {}", kind, user.id),
            }
        }
        Ok(())
    }

    fn write_user(tx: &Transaction<'_>, user: &User) -> Result<()> {
        tx.prepare_cached(
            "INSERT INTO users (id, name, email, skills, password_hash) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                skills = excluded.skills,
                password_hash = excluded.password_hash",
        )
        .map_err(db_error)?
        .execute(params![
            user.id,
            user.name,
            user.email,
            user.skills,
            user.password_hash
        ])
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed: users.email") {
                Error::EmailTaken
            } else {
                Error::Database(e.to_string())
            }
        })?;

        tx.execute("DELETE FROM user_links WHERE user_id = ?1", params![user.id])
            .map_err(db_error)?;

        let mut insert = tx
            .prepare_cached("INSERT INTO user_links (user_id, peer_id, kind) VALUES (?1, ?2, ?3)")
            .map_err(db_error)?;
        for kind in LinkKind::ALL {
            for peer_id in user.links(kind) {
                insert
                    .execute(params![user.id, peer_id, kind.as_str()])
                    .map_err(db_error)?;
            }
        }
        Ok(())
    }
}

impl UserRepository for SqliteUserStore {
    fn get(&self, id: UserId) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let user = conn
            .prepare_cached(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
            .map_err(db_error)?
            .query_row(params![id], Self::row_to_user)
            .optional()
            .map_err(db_error)?;

        match user {
            Some(mut user) => {
                Self::load_links(&conn, &mut user)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    fn get_all(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock();

        let mut users: Vec<User> = conn
            .prepare_cached(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
            .map_err(db_error)?
            .query_map([], Self::row_to_user)
            .map_err(db_error)?
            .collect::<rusqlite::Result<_>>()
            .map_err(db_error)?;

        let positions: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(i, u)| (u.id, i)).collect();

        let mut stmt = conn
            .prepare_cached("SELECT user_id, peer_id, kind FROM user_links")
            .map_err(db_error)?;
        let links = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(db_error)?;

        for link in links {
            let (user_id, peer_id, kind) = link.map_err(db_error)?;
            let (Some(&pos), Some(kind)) = (positions.get(&user_id), LinkKind::parse(&kind)) else {
                warn!("Skipping orphan link {} -> {} ({})", user_id, peer_id, kind);
                continue;
            };
            users[pos].links_mut(kind).insert(peer_id);
        }

        Ok(users)
    }

    fn save(&self, user: &User) -> Result<()> {
        self.save_all(std::slice::from_ref(user))
    }

    fn save_all(&self, users: &[User]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_error)?;
        for user in users {
            Self::write_user(&tx, user)?;
        }
        tx.commit().map_err(db_error)?;
        debug!("SqliteUserStore saved {} users", users.len());
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let user = conn
            .prepare_cached(&format!(
                "SELECT {} FROM users WHERE email = ?1 COLLATE NOCASE",
                USER_COLUMNS
            ))
            .map_err(db_error)?
            .query_row(params![email], Self::row_to_user)
            .optional()
            .map_err(db_error)?;

        match user {
            Some(mut user) => {
                Self::load_links(&conn, &mut user)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(db_error)?;
        Ok(count as usize)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

fn db_error(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}
