use super::*;

fn approval_email(to: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Quote #42 Approved".to_string(),
        body: "Dear Jane,\n\nYour quote has been approved.".to_string(),
    }
}

#[test]
fn test_email_config_default() {
    let config = EmailConfig::default();
    assert_eq!(config.smtp_host, "localhost");
    assert_eq!(config.smtp_port, 1025);
    assert!(config.smtp_insecure);
}

#[tokio::test]
async fn test_create_transport_local_catcher() {
    let service = EmailService::new(EmailConfig::default());
    assert!(service.create_transport().is_ok());
}

#[tokio::test]
async fn test_create_transport_with_credentials() {
    let config = EmailConfig {
        smtp_host: "smtp.example.com".to_string(),
        smtp_port: 587,
        smtp_username: "user".to_string(),
        smtp_password: "password".to_string(),
        smtp_insecure: false,
        from_email: "quotes@example.com".to_string(),
        from_name: "Example Quotes".to_string(),
    };

    let service = EmailService::new(config);
    assert!(service.create_transport().is_ok());
}

#[test]
fn test_build_message() {
    let service = EmailService::new(EmailConfig::default());
    let message = service
        .build_message(&approval_email("jane@example.com"))
        .unwrap();

    let raw = String::from_utf8(message.formatted()).unwrap();
    assert!(raw.contains("Subject: Quote #42 Approved"));
    assert!(raw.contains("To: jane@example.com"));
    assert!(raw.contains("Quotely <quotes@quotely.local>"));
}

#[test]
fn test_build_message_rejects_bad_recipient() {
    let service = EmailService::new(EmailConfig::default());
    let result = service.build_message(&approval_email("not an address"));
    assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
}

#[test]
fn test_email_error_display() {
    assert_eq!(
        format!("{}", EmailError::BuildError("msg".into())),
        "Failed to build email: msg"
    );
    assert_eq!(
        format!("{}", EmailError::SendError("msg".into())),
        "Failed to send email: msg"
    );
    assert_eq!(
        format!("{}", EmailError::InvalidAddress("msg".into())),
        "Invalid email address: msg"
    );
}
