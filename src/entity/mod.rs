//! Agent data: workers, firms, training programs and policy sentiment

pub mod firm;
pub mod policy;
pub mod training;
pub mod worker;

pub use firm::{AdoptionStatus, FirmAgent, JobPosting, LaborStrategy, SizeClass};
pub use policy::{InterventionType, PolicySupport};
pub use training::{ProgramType, TrainingProgramAgent};
pub use worker::{EducationLevel, EmploymentStatus, LifeEvent, NetworkContact, WorkerAgent};
