pub mod metrics;
pub mod notifier;
pub mod providers;
pub mod render;

pub use metrics::{get_metrics, init_metrics, record_provider_call, record_submission};
pub use notifier::{Delivery, DeliveryFailure, DeliveryPath, Notifier};
pub use providers::{
    EmailMessage, EmailProvider, MailgunProvider, MockEmailProvider, ProviderError,
    ProviderResponse, SmtpProvider,
};
pub use render::render_notification;
