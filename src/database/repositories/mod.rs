//! Repository modules
//!
//! One repository per aggregate, each holding a clone of the shared pool

pub mod course;
pub mod unit;
pub mod process;
pub mod step;
pub mod registration;
pub mod certificate;

pub use course::CourseRepository;
pub use unit::UnitRepository;
pub use process::ProcessRepository;
pub use step::StepRepository;
pub use registration::RegistrationRepository;
pub use certificate::CertificateRepository;
