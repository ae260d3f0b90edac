//! Appointment backend
//!
//! Doctors and appointments live in SQLite. Cancellation is a soft delete:
//! cancelled rows keep their data but stop counting toward serial numbers,
//! duplicates and listings.

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS doctors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    skills TEXT NOT NULL,
    availability TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS appointments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    patient_name TEXT NOT NULL,
    patient_age INTEGER NOT NULL,
    serial_number INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    doctor_id INTEGER NOT NULL REFERENCES doctors(id),
    is_deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_appointments_user ON appointments(user_id, is_deleted);
CREATE INDEX IF NOT EXISTS idx_appointments_slot ON appointments(doctor_id, date, is_deleted);
";

const SEED_DOCTORS: &[(&str, &str, &str)] = &[
    (
        "Prof. Dr. Sharmin Rahman",
        "M B B S (D A C), F C P S (OBS & Gynae)",
        "Mon-Fri 9AM-5PM",
    ),
    (
        "Dr. Rokeya Khatun",
        "MBBS, MCPS (Gynae & Obs), DGO",
        "Tue-Thu 10AM-6PM",
    ),
    (
        "DR. MIR JAKIB HOSSAIN",
        "MBBS, FCPS (MEDICINE), MD (GASTRO).",
        "Mon, Wed, Fri 8AM-4PM",
    ),
    (
        "DR. RASHIDUL HASAN SHAFIN",
        "MBBS, BCS (HEALTH), FCPS (PEDIATRICS), FCPS PART-2 (NEWBORN)",
        "Mon-Sat 9AM-3PM",
    ),
];

const DATE_COLUMN_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type ClinicResult<T> = Result<T, ClinicError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub skills: String,
    pub availability: String,
}

/// A booking request after argument validation
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: String,
    pub doctor_id: i64,
    pub patient_name: String,
    pub patient_age: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfirmation {
    pub appointment_id: i64,
    pub user_id: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub date: String,
    pub serial_number: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentSummary {
    pub id: i64,
    pub doctor_name: String,
    pub appointment_date: String,
    pub patient_name: String,
    pub serial_number: i64,
}

/// Storage and rules for doctors and appointments
#[async_trait]
pub trait ClinicBackend: Send + Sync {
    async fn list_doctors(&self) -> ClinicResult<Vec<Doctor>>;

    async fn book_appointment(&self, request: NewAppointment) -> ClinicResult<BookingConfirmation>;

    /// Soft-delete one of the user's live appointments
    async fn cancel_appointment(&self, appointment_id: i64, user_id: &str) -> ClinicResult<()>;

    /// Live appointments for a user, oldest first
    async fn list_appointments(&self, user_id: &str) -> ClinicResult<Vec<AppointmentSummary>>;
}

/// SQLite-backed clinic
#[derive(Clone)]
pub struct SqliteClinic {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteClinic {
    /// Open or create the database at the given path, seeding doctors if empty
    pub fn open<P: AsRef<Path>>(path: P) -> ClinicResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> ClinicResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> ClinicResult<Self> {
        conn.execute_batch(SCHEMA)?;
        let clinic = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        clinic.seed_doctors()?;
        Ok(clinic)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn seed_doctors(&self) -> ClinicResult<()> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }
        for (name, skills, availability) in SEED_DOCTORS {
            conn.execute(
                "INSERT INTO doctors (name, skills, availability) VALUES (?1, ?2, ?3)",
                params![name, skills, availability],
            )?;
        }
        tracing::info!(count = SEED_DOCTORS.len(), "Seeded sample doctors");
        Ok(())
    }

    /// Add a doctor (used by tests and operators; the seed covers the defaults)
    pub fn add_doctor(&self, name: &str, skills: &str, availability: &str) -> ClinicResult<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO doctors (name, skills, availability) VALUES (?1, ?2, ?3)",
            params![name, skills, availability],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

#[async_trait]
impl ClinicBackend for SqliteClinic {
    async fn list_doctors(&self) -> ClinicResult<Vec<Doctor>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT id, name, skills, availability FROM doctors ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Doctor {
                id: row.get(0)?,
                name: row.get(1)?,
                skills: row.get(2)?,
                availability: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(ClinicError::from)
    }

    async fn book_appointment(&self, request: NewAppointment) -> ClinicResult<BookingConfirmation> {
        let patient_name = request.patient_name.trim();
        if patient_name.is_empty() {
            return Err(ClinicError::Invalid("Patient name is required".to_string()));
        }
        if request.patient_age <= 0 || request.patient_age > 150 {
            return Err(ClinicError::Invalid("Invalid patient age".to_string()));
        }

        let date = request.date.format(DATE_COLUMN_FORMAT).to_string();
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let doctor_name: String = tx
            .query_row(
                "SELECT name FROM doctors WHERE id = ?1",
                params![request.doctor_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| ClinicError::NotFound("Doctor not found".to_string()))?;

        let duplicate: Option<i64> = tx
            .query_row(
                "SELECT id FROM appointments
                 WHERE user_id = ?1 AND doctor_id = ?2 AND date = ?3 AND patient_name = ?4 AND is_deleted = 0",
                params![request.user_id, request.doctor_id, date, patient_name],
                |row| row.get(0),
            )
            .optional()?;
        if duplicate.is_some() {
            return Err(ClinicError::Conflict("Already booked by you".to_string()));
        }

        let booked: i64 = tx.query_row(
            "SELECT COUNT(*) FROM appointments WHERE doctor_id = ?1 AND date = ?2 AND is_deleted = 0",
            params![request.doctor_id, date],
            |row| row.get(0),
        )?;
        let serial_number = booked + 1;

        tx.execute(
            "INSERT INTO appointments (date, patient_name, patient_age, serial_number, user_id, doctor_id, is_deleted, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            params![
                date,
                patient_name,
                request.patient_age,
                serial_number,
                request.user_id,
                request.doctor_id,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        let appointment_id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!(
            appointment_id,
            doctor_id = request.doctor_id,
            user_id = %request.user_id,
            serial_number,
            "Appointment booked"
        );

        Ok(BookingConfirmation {
            appointment_id,
            user_id: request.user_id,
            patient_name: patient_name.to_string(),
            doctor_name,
            date,
            serial_number,
            message: "Appointment booked successfully".to_string(),
        })
    }

    async fn cancel_appointment(&self, appointment_id: i64, user_id: &str) -> ClinicResult<()> {
        let conn = self.lock();
        let updated = conn.execute(
            "UPDATE appointments SET is_deleted = 1 WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0",
            params![appointment_id, user_id],
        )?;
        if updated == 0 {
            return Err(ClinicError::NotFound("Appointment not found".to_string()));
        }
        tracing::info!(appointment_id, user_id = %user_id, "Appointment cancelled");
        Ok(())
    }

    async fn list_appointments(&self, user_id: &str) -> ClinicResult<Vec<AppointmentSummary>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT a.id, d.name, a.date, a.patient_name, a.serial_number
             FROM appointments a JOIN doctors d ON a.doctor_id = d.id
             WHERE a.user_id = ?1 AND a.is_deleted = 0
             ORDER BY a.id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(AppointmentSummary {
                id: row.get(0)?,
                doctor_name: row.get(1)?,
                appointment_date: row.get(2)?,
                patient_name: row.get(3)?,
                serial_number: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(ClinicError::from)
    }
}
