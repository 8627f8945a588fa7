use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor};
use snafu::{Location, ResultExt as _, Snafu};

use crate::config::MailConfig;
use crate::model::User;

pub type Result<T, E = MailError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MailError {
    #[snafu(display("`{address}` is not a valid mail address at {location}: {source}"))]
    InvalidAddress {
        address: String,
        source: lettre::address::AddressError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot reach the mail relay `{host}` at {location}: {source}"))]
    Relay {
        host: String,
        source: lettre::transport::smtp::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to build the mail at {location}: {source}"))]
    BuildMessage {
        source: lettre::error::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to hand the mail to the relay at {location}: {source}"))]
    Transport {
        source: lettre::transport::smtp::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Best-effort mail dispatch over async SMTP. Delivery is attempted once and
/// never retried.
///
/// Without SMTP settings the mailer runs in a disabled mode that logs the mail
/// instead of delivering it, which keeps the verification flow exercisable in
/// development and tests.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    public_url: String,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("transport", &self.transport.is_some())
            .field("from", &self.from)
            .field("public_url", &self.public_url)
            .finish()
    }
}

impl Mailer {
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let Some(smtp) = &config.smtp else {
            return Ok(Mailer::disabled(config.public_url.clone()));
        };

        let from = smtp.from.parse().context(InvalidAddressSnafu {
            address: &smtp.from,
        })?;

        let credentials = Credentials::new(smtp.username.clone(), smtp.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.relay)
            .context(RelaySnafu { host: &smtp.relay })?
            .credentials(credentials)
            .build();

        Ok(Mailer {
            transport: Some(transport),
            from,
            public_url: config.public_url.clone(),
        })
    }

    /// A mailer with no transport: every send is logged and reported successful.
    pub fn disabled(public_url: impl Into<String>) -> Self {
        let from = "Tanuki <no-reply@localhost>"
            .parse()
            .expect("static sender address");

        Mailer {
            transport: None,
            from,
            public_url: public_url.into(),
        }
    }

    /// Sends the account-verification mail containing the `/user/verify/:id` link.
    pub async fn send_verification(&self, user: &User) -> Result<()> {
        let recipient: Mailbox = user.email.parse().context(InvalidAddressSnafu {
            address: &user.email,
        })?;

        let link = format!("{}/user/verify/{}", self.public_url, user.id);
        let body = format!(
            "<p>Hi {},</p>\
             <p>Confirm your account by following <a href=\"{link}\">this link</a>.</p>",
            user.first_name
        );

        let Some(transport) = &self.transport else {
            tracing::info!(email = %user.email, %link, "smtp transport not configured, skipping delivery");
            return Ok(());
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject("Verify your account")
            .header(ContentType::TEXT_HTML)
            .body(body)
            .context(BuildMessageSnafu)?;

        transport.send(message).await.context(TransportSnafu)?;
        tracing::info!(email = %user.email, "verification email sent");

        Ok(())
    }
}
