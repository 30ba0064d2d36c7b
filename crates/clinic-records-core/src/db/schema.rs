//! SQLite schema definition.
//!
//! Foreign keys carry no `ON DELETE` action: dependent rows are removed by the
//! ownership walk in `cascade.rs`, and the engine rejects any delete that would
//! leave a dangling reference behind.

/// Every table, children before parents. Drop order for a reset.
pub const TABLES: &[&str] = &[
    "billing_records",
    "lab_tests",
    "prescriptions",
    "visits",
    "medications",
    "practitioners",
    "patients",
];

/// Complete database schema.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL CHECK (length(first_name) BETWEEN 1 AND 50),
    last_name TEXT NOT NULL CHECK (length(last_name) BETWEEN 1 AND 50),
    birth_date TEXT NOT NULL,
    gender TEXT NOT NULL CHECK (gender IN ('Male', 'Female', 'Other')),
    address TEXT CHECK (address IS NULL OR length(address) <= 255),
    city TEXT CHECK (city IS NULL OR length(city) <= 50),
    state TEXT CHECK (state IS NULL OR length(state) <= 50),
    zip_code TEXT CHECK (zip_code IS NULL OR length(zip_code) <= 10),
    phone TEXT NOT NULL CHECK (length(phone) BETWEEN 1 AND 20),
    email TEXT UNIQUE CHECK (email IS NULL OR length(email) BETWEEN 1 AND 100),
    insurance_provider TEXT CHECK (insurance_provider IS NULL OR length(insurance_provider) <= 100),
    insurance_number TEXT CHECK (insurance_number IS NULL OR length(insurance_number) <= 50),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(last_name, first_name);

-- ============================================================================
-- Practitioners
-- ============================================================================

CREATE TABLE IF NOT EXISTS practitioners (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL CHECK (length(first_name) BETWEEN 1 AND 50),
    last_name TEXT NOT NULL CHECK (length(last_name) BETWEEN 1 AND 50),
    specialization TEXT NOT NULL CHECK (length(specialization) BETWEEN 1 AND 100),
    phone TEXT NOT NULL CHECK (length(phone) BETWEEN 1 AND 20),
    email TEXT NOT NULL UNIQUE CHECK (length(email) BETWEEN 1 AND 100),
    license_number TEXT NOT NULL UNIQUE CHECK (length(license_number) BETWEEN 1 AND 50),
    hire_date TEXT,
    department TEXT NOT NULL CHECK (length(department) BETWEEN 1 AND 100),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Medications (shared catalog, amounts in cents)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(name) BETWEEN 1 AND 100),
    description TEXT,
    category TEXT CHECK (category IS NULL OR length(category) <= 50),
    unit_price INTEGER NOT NULL DEFAULT 0 CHECK (unit_price >= 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Visits (owned jointly by a patient and a practitioner)
-- ============================================================================

CREATE TABLE IF NOT EXISTS visits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    practitioner_id INTEGER NOT NULL REFERENCES practitioners(id),
    visit_date TEXT NOT NULL,
    purpose TEXT CHECK (purpose IS NULL OR length(purpose) <= 255),
    diagnosis TEXT,
    status TEXT NOT NULL DEFAULT 'Scheduled'
        CHECK (status IN ('Scheduled', 'Completed', 'Cancelled')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_visits_patient ON visits(patient_id);
CREATE INDEX IF NOT EXISTS idx_visits_practitioner ON visits(practitioner_id);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visit_id INTEGER NOT NULL REFERENCES visits(id),
    medication_id INTEGER NOT NULL REFERENCES medications(id),
    dosage TEXT NOT NULL CHECK (length(dosage) BETWEEN 1 AND 50),
    frequency TEXT NOT NULL CHECK (length(frequency) BETWEEN 1 AND 50),
    duration TEXT NOT NULL CHECK (length(duration) BETWEEN 1 AND 50),
    instructions TEXT,
    prescribed_date TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_visit ON prescriptions(visit_id);
CREATE INDEX IF NOT EXISTS idx_prescriptions_medication ON prescriptions(medication_id);

-- ============================================================================
-- Lab Tests
-- ============================================================================

CREATE TABLE IF NOT EXISTS lab_tests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visit_id INTEGER NOT NULL REFERENCES visits(id),
    test_name TEXT NOT NULL CHECK (length(test_name) BETWEEN 1 AND 100),
    test_date TEXT NOT NULL,
    results TEXT,
    status TEXT NOT NULL DEFAULT 'Pending'
        CHECK (status IN ('Pending', 'Completed', 'Cancelled')),
    cost INTEGER CHECK (cost IS NULL OR cost >= 0),
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_lab_tests_visit ON lab_tests(visit_id);

-- ============================================================================
-- Billing Records (one per visit, amounts in cents)
-- ============================================================================

CREATE TABLE IF NOT EXISTS billing_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visit_id INTEGER NOT NULL UNIQUE REFERENCES visits(id),
    total_amount INTEGER NOT NULL CHECK (total_amount >= 0),
    paid_amount INTEGER NOT NULL DEFAULT 0 CHECK (paid_amount >= 0),
    -- Derived; recomputed by the engine on every write to either operand
    balance INTEGER GENERATED ALWAYS AS (total_amount - paid_amount) STORED,
    billing_date TEXT NOT NULL DEFAULT (date('now')),
    due_date TEXT,
    status TEXT NOT NULL DEFAULT 'Pending'
        CHECK (status IN ('Pending', 'Partially Paid', 'Paid', 'Overdue')),
    payment_method TEXT CHECK (payment_method IS NULL OR length(payment_method) <= 50),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_reapplies_cleanly() {
        let conn = conn();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_every_table_listed() {
        let conn = conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count as usize, TABLES.len());
    }

    #[test]
    fn test_gender_check_constraint() {
        let conn = conn();
        let result = conn.execute(
            "INSERT INTO patients (first_name, last_name, birth_date, gender, phone)
             VALUES ('A', 'B', '1990-01-01', 'Unknown', '555')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_balance_is_generated() {
        let conn = conn();
        conn.execute_batch(
            "INSERT INTO patients (first_name, last_name, birth_date, gender, phone)
                 VALUES ('A', 'B', '1990-01-01', 'Other', '555');
             INSERT INTO practitioners (first_name, last_name, specialization, phone, email, license_number, department)
                 VALUES ('C', 'D', 'GP', '555', 'c@d.org', 'L1', 'General');
             INSERT INTO visits (patient_id, practitioner_id, visit_date) VALUES (1, 1, '2024-01-01 09:00:00');
             INSERT INTO billing_records (visit_id, total_amount, paid_amount) VALUES (1, 10000, 4000);",
        )
        .unwrap();

        let balance: i64 = conn
            .query_row("SELECT balance FROM billing_records WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(balance, 6000);

        // The derived column cannot be written directly
        let result = conn.execute("UPDATE billing_records SET balance = 0 WHERE id = 1", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_dangling_visit_rejected() {
        let conn = conn();
        let result = conn.execute(
            "INSERT INTO visits (patient_id, practitioner_id, visit_date) VALUES (99, 99, '2024-01-01 09:00:00')",
            [],
        );
        assert!(result.is_err());
    }
}
