pub mod per_diem_repo;
pub use per_diem_repo::{PerDiemRepository, PerDiemStore};
pub mod approval_repo;
pub use approval_repo::{ApprovalRepository, ApprovalStore};
pub mod notification_repo;
pub use notification_repo::{NotificationRepository, NotificationStore};
pub mod certificate_repo;
pub use certificate_repo::{CertificateRepository, CertificateStore};

#[cfg(test)]
pub mod memory;
