//! Timestamped backups of the snapshot file.
//!
//! Backup files are stored as `{backup_dir}/{YYYYMMDD_HHMMSS}_{file_name}`;
//! only the newest `MAX_BACKUPS` are kept.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Максимальное количество хранимых бэкапов
const MAX_BACKUPS: usize = 30;

pub struct BackupManager {
    backup_dir: PathBuf,
}

impl BackupManager {
    /// `base_dir` обычно берётся из [`crate::core::config::BACKUP_DIR`].
    pub fn new(base_dir: &str) -> Self {
        let expanded = shellexpand::tilde(base_dir).into_owned();
        Self {
            backup_dir: PathBuf::from(expanded),
        }
    }

    /// Создает директорию для бэкапов если её нет
    fn ensure_backup_dir(&self) -> Result<()> {
        if !self.backup_dir.exists() {
            fs::create_dir_all(&self.backup_dir)?;
            log::info!("Created backup directory: {}", self.backup_dir.display());
        }
        Ok(())
    }

    /// Создает бэкап файла снапшота и возвращает путь к нему.
    /// Старые бэкапы сверх лимита удаляются.
    pub fn create_backup(&self, store_path: &Path) -> Result<PathBuf> {
        self.ensure_backup_dir()?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let file_name = store_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("store.json");
        let backup_path = self.backup_dir.join(format!("{}_{}", timestamp, file_name));

        fs::copy(store_path, &backup_path)?;
        log::info!("Created snapshot backup: {}", backup_path.display());

        self.cleanup_old_backups()?;
        Ok(backup_path)
    }

    /// Собирает все бэкапы с их временными метками, новые первыми.
    fn scan_backups(&self) -> Result<Vec<(PathBuf, DateTime<Utc>)>> {
        let mut backups: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
        if self.backup_dir.is_dir() {
            for entry in fs::read_dir(&self.backup_dir)? {
                let path = entry?.path();
                if !path.is_file() {
                    continue;
                }
                if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                    if let Some(dt) = parse_backup_timestamp(file_name) {
                        backups.push((path, dt));
                    }
                }
            }
        }
        backups.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(backups)
    }

    /// Удаляет старые бэкапы, оставляя только последние MAX_BACKUPS
    fn cleanup_old_backups(&self) -> Result<()> {
        let backups = self.scan_backups()?;
        for (path, _) in backups.iter().skip(MAX_BACKUPS) {
            if let Err(e) = fs::remove_file(path) {
                log::warn!("Failed to remove old backup {}: {}", path.display(), e);
            } else {
                log::info!("Removed old backup: {}", path.display());
            }
        }
        Ok(())
    }

    /// Список всех бэкапов, новые первыми.
    pub fn list_backups(&self) -> Result<Vec<(PathBuf, DateTime<Utc>)>> {
        self.ensure_backup_dir()?;
        self.scan_backups()
    }

    /// Восстанавливает снапшот из бэкапа. Store должен быть открыт
    /// заново после восстановления.
    pub fn restore_backup(&self, backup_path: &Path, store_path: &Path) -> Result<()> {
        if !backup_path.exists() {
            return Err(anyhow::anyhow!(
                "Backup file does not exist: {}",
                backup_path.display()
            ));
        }
        fs::copy(backup_path, store_path)?;
        log::info!("Restored snapshot from backup: {}", backup_path.display());
        Ok(())
    }
}

/// Извлекает метку времени из имени файла `YYYYMMDD_HHMMSS_...`.
fn parse_backup_timestamp(file_name: &str) -> Option<DateTime<Utc>> {
    let stamp = file_name.get(0..15)?;
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S")
        .ok()
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_manager() -> (TempDir, BackupManager, PathBuf) {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let store_path = dir.path().join("store.json");
        std::fs::write(&store_path, r#"{"version":1}"#).expect("failed to seed store file");
        let manager = BackupManager::new(dir.path().join("backups").to_str().unwrap());
        (dir, manager, store_path)
    }

    #[test]
    fn test_create_backup_copies_snapshot() {
        let (_dir, manager, store_path) = make_manager();
        let backup_path = manager.create_backup(&store_path).expect("backup created");
        assert!(backup_path.exists());
        let content = std::fs::read_to_string(&backup_path).expect("readable");
        assert_eq!(content, r#"{"version":1}"#);
    }

    #[test]
    fn test_list_backups_sees_created_backup() {
        let (_dir, manager, store_path) = make_manager();
        assert!(manager.list_backups().expect("listable").is_empty());
        manager.create_backup(&store_path).expect("backup created");
        assert_eq!(manager.list_backups().expect("listable").len(), 1);
    }

    #[test]
    fn test_restore_backup_overwrites_store_file() {
        let (_dir, manager, store_path) = make_manager();
        let backup_path = manager.create_backup(&store_path).expect("backup created");
        std::fs::write(&store_path, "{ corrupted").expect("writable");
        manager
            .restore_backup(&backup_path, &store_path)
            .expect("restored");
        let content = std::fs::read_to_string(&store_path).expect("readable");
        assert_eq!(content, r#"{"version":1}"#);
    }

    #[test]
    fn test_restore_missing_backup_fails() {
        let (_dir, manager, store_path) = make_manager();
        let missing = manager.backup_dir.join("20990101_000000_store.json");
        assert!(manager.restore_backup(&missing, &store_path).is_err());
    }

    #[test]
    fn test_cleanup_keeps_newest_backups() {
        let (_dir, manager, _store_path) = make_manager();
        manager.ensure_backup_dir().expect("dir created");
        // бэкапы с искусственными метками, по одному на "день"
        for day in 1..=(MAX_BACKUPS + 5) {
            let name = format!("2025{:02}{:02}_000000_store.json", (day / 28) + 1, (day % 28) + 1);
            std::fs::write(manager.backup_dir.join(name), "x").expect("writable");
        }
        manager.cleanup_old_backups().expect("cleaned");
        assert_eq!(manager.list_backups().expect("listable").len(), MAX_BACKUPS);
    }

    #[test]
    fn test_timestamp_parsing() {
        assert!(parse_backup_timestamp("20250807_121314_store.json").is_some());
        assert!(parse_backup_timestamp("store.json").is_none());
        assert!(parse_backup_timestamp("2025-08-07_store.json").is_none());
    }
}
