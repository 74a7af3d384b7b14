#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mentor_bookings::{
    directory::{NewUser, UserDirectory},
    entity::user,
    meeting::{MeetingRequest, ProviderError},
    migration::{Migrator, MigratorTrait},
    Meeting, MeetingProvider, MemorySink, Notifier, Provisioner, Role, SessionLedger,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub async fn database() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    // One connection, so every query sees the same in-memory database.
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, minute, 0).unwrap()
}

/// Meeting provider that records calls and can be told to fail.
#[derive(Default)]
pub struct RecordingProvider {
    pub fail_create: bool,
    pub fail_delete: bool,
    pub created: Mutex<Vec<MeetingRequest>>,
    pub deleted: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

impl RecordingProvider {
    pub fn unreachable() -> Self {
        Self {
            fail_create: true,
            fail_delete: true,
            ..Self::default()
        }
    }

    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Self::default()
        }
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeetingProvider for RecordingProvider {
    async fn create_meeting(&self, request: &MeetingRequest) -> Result<Meeting, ProviderError> {
        self.created.lock().unwrap().push(request.clone());
        if self.fail_create {
            return Err(ProviderError::Auth("Failed to authenticate with Zoom".into()));
        }
        let id = 80_000_000_000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Meeting {
            meeting_id: id.to_string(),
            join_url: format!("https://zoom.us/j/{id}"),
            password: "s3cret".into(),
        })
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), ProviderError> {
        self.deleted.lock().unwrap().push(meeting_id.to_string());
        if self.fail_delete {
            return Err(ProviderError::Status {
                status: 404,
                body: "Meeting does not exist".into(),
            });
        }
        Ok(())
    }
}

pub struct World {
    pub db: DatabaseConnection,
    pub ledger: SessionLedger,
    pub directory: UserDirectory,
    pub sink: MemorySink,
    pub provider: Arc<RecordingProvider>,
    pub mentee: user::Model,
    pub other_mentee: user::Model,
    pub mentor: user::Model,
    pub other_mentor: user::Model,
}

impl World {
    pub async fn new() -> Self {
        Self::with(RecordingProvider::default(), MemorySink::new()).await
    }

    pub async fn with(provider: RecordingProvider, sink: MemorySink) -> Self {
        let db = database().await;
        let directory = UserDirectory::new(db.clone());
        let provider = Arc::new(provider);
        let ledger = SessionLedger::new(
            db.clone(),
            Provisioner::new(provider.clone()),
            Notifier::new(Arc::new(sink.clone())),
        );

        let mentee = register(&directory, "Ada Lovelace", "ada@example.com", Role::Mentee, false).await;
        let other_mentee = register(&directory, "Mary Somerville", "mary@example.com", Role::Mentee, false).await;
        let mentor = register(&directory, "Alan Turing", "alan@uni.edu", Role::Mentor, true).await;
        let other_mentor = register(&directory, "Grace Hopper", "grace@uni.edu", Role::Mentor, true).await;

        Self {
            db,
            ledger,
            directory,
            sink,
            provider,
            mentee,
            other_mentee,
            mentor,
            other_mentor,
        }
    }
}

pub async fn register(
    directory: &UserDirectory,
    name: &str,
    email: &str,
    role: Role,
    approved: bool,
) -> user::Model {
    directory
        .register(NewUser {
            email: email.into(),
            full_name: name.into(),
            university: (role == Role::Mentor).then(|| "State University".to_string()),
            role,
            is_approved: approved,
        })
        .await
        .unwrap()
}
