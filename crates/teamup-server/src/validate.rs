//! Offline consistency check of a SQLite user store.

use std::path::Path;
use std::sync::Arc;

use teamup_core::DataPaths;
use teamup_social::ConnectionGraph;
use teamup_store::{SqliteUserStore, UserRepository};

pub struct ValidationReport {
    pub db_valid: bool,
    pub users: usize,
    pub connections: usize,
    pub pending_requests: usize,
    pub violations: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.db_valid && self.errors.is_empty() && self.violations.is_empty()
    }
}

/// Open `data_dir/db/teamup.db` and check every relationship rule.
pub fn validate(data_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport {
        db_valid: false,
        users: 0,
        connections: 0,
        pending_requests: 0,
        violations: Vec::new(),
        errors: Vec::new(),
    };

    let db_path = DataPaths::new(data_dir).db_dir.join("teamup.db");
    let store = match SqliteUserStore::open_existing(&db_path) {
        Ok(store) => store,
        Err(e) => {
            report.errors.push(format!("Failed to open {}: {}", db_path.display(), e));
            return report;
        }
    };

    let users = match store.get_all() {
        Ok(users) => users,
        Err(e) => {
            report.errors.push(format!("Failed to read users: {}", e));
            return report;
        }
    };
    report.db_valid = true;
    report.users = users.len();
    // Each accepted connection is stored on both sides.
    report.connections = users.iter().map(|u| u.connections.len()).sum::<usize>() / 2;
    report.pending_requests = users.iter().map(|u| u.pending_requests.len()).sum();

    let graph = ConnectionGraph::new(Arc::new(store));
    match graph.audit() {
        Ok(violations) => {
            report.violations = violations.iter().map(|v| v.to_string()).collect();
        }
        Err(e) => report.errors.push(format!("Audit failed: {}", e)),
    }

    report
}

pub fn print_report(report: &ValidationReport) {
    println!("=== Team-Up Validation Report ===");
    println!();
    println!("Database valid:     {}", if report.db_valid { "YES" } else { "NO" });
    println!("Users:              {}", report.users);
    println!("Connections:        {}", report.connections);
    println!("Pending requests:   {}", report.pending_requests);

    if !report.violations.is_empty() {
        println!();
        println!("Violations:");
        for v in &report.violations {
            println!("  - {}", v);
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("Errors:");
        for e in &report.errors {
            println!("  - {}", e);
        }
    }

    println!();
    if report.is_clean() {
        println!("Status: CONSISTENT");
    } else {
        println!("Status: INCONSISTENT");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamup_store::User;
    use tempfile::TempDir;

    #[test]
    fn test_validate_missing_db() {
        let dir = TempDir::new().unwrap();
        let report = validate(dir.path());
        assert!(!report.db_valid);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_validate_consistent_db() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteUserStore::open(DataPaths::new(dir.path()).db_dir).unwrap();
            let mut a = User::new(1, "A", "a@x.io", "", "h");
            let mut b = User::new(2, "B", "b@x.io", "", "h");
            let mut c = User::new(3, "C", "c@x.io", "", "h");
            a.connections.insert(2);
            b.connections.insert(1);
            c.sent_requests.insert(1);
            a.pending_requests.insert(3);
            store.save_all(&[a, b, c]).unwrap();
        }

        let report = validate(dir.path());
        assert!(report.is_clean(), "violations: {:?}", report.violations);
        assert_eq!(report.users, 3);
        assert_eq!(report.connections, 1);
        assert_eq!(report.pending_requests, 1);
    }

    #[test]
    fn test_validate_reports_violations() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteUserStore::open(DataPaths::new(dir.path()).db_dir).unwrap();
            let mut a = User::new(1, "A", "a@x.io", "", "h");
            a.connections.insert(2);
            store.save_all(&[a, User::new(2, "B", "b@x.io", "", "h")]).unwrap();
        }

        let report = validate(dir.path());
        assert!(report.db_valid);
        assert!(!report.is_clean());
        assert_eq!(report.violations.len(), 1);
    }
}
