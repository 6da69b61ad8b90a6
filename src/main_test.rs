use chrono::{TimeZone, Utc};

use super::*;

fn notification(id: &str) -> Notification {
    Notification {
        id: id.to_owned(),
        kind: NotificationType::Sms,
        recipients: vec!["+15550001".to_owned(), "+15550002".to_owned()],
        subject: "Outage".to_owned(),
        message: "Service is down".to_owned(),
        user_id: None,
        created_at: None,
        updated_at: None,
    }
}

fn log(status: NotificationStatus) -> NotificationLog {
    NotificationLog {
        id: "l1".to_owned(),
        notification_id: "n1".to_owned(),
        status,
        scheduled_at: None,
        sent_at: None,
        message_id: None,
        error_message: None,
        sender_id: None,
        job_id: None,
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn parses_create_with_type_and_recipients() {
    let cli = Cli::try_parse_from([
        "notifydesk",
        "notification",
        "create",
        "--type",
        "SMS",
        "--recipients",
        "a, b",
        "--subject",
        "Hi",
        "--message",
        "Body",
    ])
    .unwrap();
    let Command::Notification(NotificationCommand {
        command: NotificationSubcommand::Create { kind, recipients, .. },
    }) = cli.command
    else {
        panic!("expected notification create");
    };
    assert_eq!(kind, NotificationType::Sms);
    assert_eq!(recipients, "a, b");
}

#[test]
fn create_defaults_to_email() {
    let cli = Cli::try_parse_from([
        "notifydesk",
        "notification",
        "create",
        "--recipients",
        "a@b.com",
        "--subject",
        "Hi",
        "--message",
        "Body",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Command::Notification(NotificationCommand {
            command: NotificationSubcommand::Create { kind: NotificationType::Email, .. }
        })
    ));
}

#[test]
fn rejects_unknown_notification_type() {
    let result = Cli::try_parse_from([
        "notifydesk",
        "notification",
        "create",
        "--type",
        "fax",
        "--recipients",
        "a",
        "--subject",
        "s",
        "--message",
        "m",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_logs_status_filter_and_global_flags() {
    let cli =
        Cli::try_parse_from(["notifydesk", "logs", "--status", "failed", "--json", "--base-url", "http://x"]).unwrap();
    assert!(cli.json);
    assert_eq!(cli.base_url.as_deref(), Some("http://x"));
    assert!(matches!(cli.command, Command::Logs { status: Some(NotificationStatus::Failed) }));
}

#[test]
fn parses_send_schedule_and_delete_confirmation_flag() {
    let cli = Cli::try_parse_from(["notifydesk", "notification", "send", "n1", "--at", "2030-01-01T09:00"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Notification(NotificationCommand {
            command: NotificationSubcommand::Send { ref id, at: Some(ref at) }
        }) if id == "n1" && at == "2030-01-01T09:00"
    ));

    let cli = Cli::try_parse_from(["notifydesk", "notification", "delete", "n1", "-y"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Notification(NotificationCommand { command: NotificationSubcommand::Delete { yes: true, .. } })
    ));
}

#[test]
fn affirmative_answers() {
    assert!(is_affirmative("y\n"));
    assert!(is_affirmative(" YES "));
    assert!(!is_affirmative(""));
    assert!(!is_affirmative("no"));
}

#[test]
fn empty_notification_list_points_at_create() {
    assert!(render_notifications(&[], false).contains("notifydesk notification create"));
}

#[test]
fn notification_rows_show_badge_and_recipients() {
    let out = render_notifications(&[notification("n1")], false);
    assert!(out.starts_with("n1  SMS"), "{out}");
    assert!(out.contains("to: +15550001, +15550002"));
    assert!(out.contains("created: -"));
}

#[test]
fn colored_badges_carry_ansi_codes() {
    let out = render_notifications(&[notification("n1")], true);
    assert!(out.contains("\x1b[32mSMS\x1b[0m"), "{out:?}");
}

#[test]
fn detail_includes_message_body() {
    let out = render_notification_detail(&notification("n1"), false);
    assert!(out.starts_with("SMS n1\n"));
    assert!(out.ends_with("Service is down\n"));
}

#[test]
fn logs_render_optional_fields_only_when_present() {
    let mut failed = log(NotificationStatus::Failed);
    failed.error_message = Some("bounced".to_owned());
    failed.sent_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
    let out = render_logs(&[failed, log(NotificationStatus::Pending)], false);
    assert!(out.contains("l1  FAILED  notification n1"));
    assert!(out.contains("error: bounced"));
    assert!(out.contains("sent: 2024-"));
    assert!(out.contains("PENDING"));
    assert_eq!(out.matches("scheduled:").count(), 0);
}

#[test]
fn empty_logs_message() {
    assert_eq!(render_logs(&[], false), "No logs found.\n");
}

#[test]
fn describe_user_formats_name_and_email() {
    let user = User {
        id: "1".to_owned(),
        email: "a@b.com".to_owned(),
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        designation: String::new(),
    };
    assert_eq!(describe_user(&user), "Ada Lovelace <a@b.com>");
}

#[test]
fn rejected_login_shows_backend_message() {
    let err = CliError::Rejected(ApiError::Unauthorized { message: Some("Invalid credentials".to_owned()) });
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!matches!(err, CliError::Api(_)));
}

#[test]
fn only_login_and_signup_are_auth_attempts() {
    let login = Cli::try_parse_from(["notifydesk", "login", "--email", "a@b.com", "--password", "pw"]).unwrap();
    assert!(login.command.is_auth_attempt());
    let whoami = Cli::try_parse_from(["notifydesk", "whoami"]).unwrap();
    assert!(!whoami.command.is_auth_attempt());
}
