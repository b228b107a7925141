pub mod approval_service;
pub use approval_service::ApprovalService;
pub mod certificate_service;
pub use certificate_service::CertificateService;
pub mod notification_service;
pub use notification_service::NotificationService;
pub mod per_diem_service;
pub use per_diem_service::PerDiemService;
