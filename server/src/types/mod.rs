pub mod encoding;
pub mod envelope;
pub mod response;
pub mod ssh;
pub mod x509;

pub use envelope::RequestEnvelope;
pub use response::ResponseBody;
pub use ssh::{SshCertificate, SshCertificateRequest};
pub use x509::{Subject, X509Certificate, X509CertificateRequest};
