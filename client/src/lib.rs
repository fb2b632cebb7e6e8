//! Client side of the survey pipeline: the locally persisted buffer, the
//! submission client with its trigger scheduler, the transports, the email
//! gate, and the CSV fallback exporter.

pub mod buffer;
pub mod client;
pub mod config;
pub mod export;
pub mod form;
pub mod scheduler;
pub mod transport;
pub mod validate;

pub use buffer::LocalBuffer;
pub use client::SubmissionClient;
pub use client::SubmitError;
pub use client::SubmitOutcome;
pub use config::ClientConfig;
pub use config::ConfigLoader;
pub use export::FallbackExporter;
pub use form::FieldValue;
pub use form::FormState;
pub use scheduler::PageEvent;
pub use scheduler::SchedulerHandle;
pub use scheduler::SubmissionScheduler;
pub use transport::Delivery;
pub use transport::HttpTransport;
pub use transport::Transport;
pub use validate::EmailValidation;
pub use validate::validate_email;
