//! Outbound email notifications for workflow milestones.
//!
//! Uses SMTP via lettre with askama HTML templates. Every send is
//! best-effort: callers fire notifications after their transaction commits,
//! and a delivery failure is logged and swallowed, never propagated back
//! into the workflow that triggered it.
//!
//! When SMTP is not configured the notifier runs disabled and logs what it
//! would have sent.

use askama::Template;
use lettre::message::header::ContentType;
use lettre::message::{MultiPart, SinglePart};
use lettre::transport::smtp::Error as SmtpError;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use thiserror::Error;

use sylera_core::{Money, OrderId};

use crate::config::SmtpConfig;

/// HTML template for the order placed email.
#[derive(Template)]
#[template(path = "email/order_placed.html")]
struct OrderPlacedHtml {
    order_id: OrderId,
    total: Money,
}

/// Plain text template for the order placed email.
#[derive(Template)]
#[template(path = "email/order_placed.txt")]
struct OrderPlacedText {
    order_id: OrderId,
    total: Money,
}

/// HTML template for the order confirmed email.
#[derive(Template)]
#[template(path = "email/order_confirmed.html")]
struct OrderConfirmedHtml {
    order_id: OrderId,
}

/// Plain text template for the order confirmed email.
#[derive(Template)]
#[template(path = "email/order_confirmed.txt")]
struct OrderConfirmedText {
    order_id: OrderId,
}

/// HTML template for the order delivered email.
#[derive(Template)]
#[template(path = "email/order_delivered.html")]
struct OrderDeliveredHtml {
    order_id: OrderId,
}

/// Plain text template for the order delivered email.
#[derive(Template)]
#[template(path = "email/order_delivered.txt")]
struct OrderDeliveredText {
    order_id: OrderId,
}

/// HTML template for the ops-inbox new order email.
#[derive(Template)]
#[template(path = "email/admin_new_order.html")]
struct AdminNewOrderHtml<'a> {
    order_id: OrderId,
    customer_email: &'a str,
    total: Money,
}

/// Plain text template for the ops-inbox new order email.
#[derive(Template)]
#[template(path = "email/admin_new_order.txt")]
struct AdminNewOrderText<'a> {
    order_id: OrderId,
    customer_email: &'a str,
    total: Money,
}

/// HTML template for the welcome email.
#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeHtml<'a> {
    name: &'a str,
}

/// Plain text template for the welcome email.
#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeText<'a> {
    name: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Clone)]
struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

/// Best-effort email notifier for order and account milestones.
#[derive(Clone)]
pub struct Notifier {
    mailer: Option<Mailer>,
    ops_inbox: Option<String>,
}

impl Notifier {
    /// Create a notifier from optional SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns error if SMTP relay setup fails.
    pub fn new(
        smtp: Option<&SmtpConfig>,
        ops_inbox: Option<String>,
    ) -> Result<Self, SmtpError> {
        let mailer = match smtp {
            Some(config) => {
                let credentials = Credentials::new(
                    config.username.clone(),
                    config.password.expose_secret().to_string(),
                );

                let transport =
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
                        .port(config.port)
                        .credentials(credentials)
                        .build();

                Some(Mailer {
                    transport,
                    from_address: config.from_address.clone(),
                })
            }
            None => {
                tracing::info!("SMTP not configured, email notifier disabled");
                None
            }
        };

        Ok(Self { mailer, ops_inbox })
    }

    /// Notify a customer that their order was placed.
    pub async fn order_placed(&self, to: &str, order_id: OrderId, total: Money) {
        let result = self
            .render_and_send(
                to,
                "Your Sylera order has been placed",
                OrderPlacedText { order_id, total }.render(),
                OrderPlacedHtml { order_id, total }.render(),
            )
            .await;
        log_outcome("order_placed", to, result);
    }

    /// Notify a customer that their order was confirmed.
    pub async fn order_confirmed(&self, to: &str, order_id: OrderId) {
        let result = self
            .render_and_send(
                to,
                "Your Sylera order is confirmed",
                OrderConfirmedText { order_id }.render(),
                OrderConfirmedHtml { order_id }.render(),
            )
            .await;
        log_outcome("order_confirmed", to, result);
    }

    /// Notify a customer that their order was delivered.
    pub async fn order_delivered(&self, to: &str, order_id: OrderId) {
        let result = self
            .render_and_send(
                to,
                "Your Sylera order has been delivered",
                OrderDeliveredText { order_id }.render(),
                OrderDeliveredHtml { order_id }.render(),
            )
            .await;
        log_outcome("order_delivered", to, result);
    }

    /// Notify the operations inbox of a new order.
    pub async fn new_order_ops(&self, order_id: OrderId, customer_email: &str, total: Money) {
        let Some(inbox) = self.ops_inbox.clone() else {
            tracing::debug!(%order_id, "no ops inbox configured, skipping new order notice");
            return;
        };

        let result = self
            .render_and_send(
                &inbox,
                "New Sylera order received",
                AdminNewOrderText {
                    order_id,
                    customer_email,
                    total,
                }
                .render(),
                AdminNewOrderHtml {
                    order_id,
                    customer_email,
                    total,
                }
                .render(),
            )
            .await;
        log_outcome("new_order_ops", &inbox, result);
    }

    /// Welcome a freshly registered customer.
    pub async fn welcome(&self, to: &str, name: &str) {
        let result = self
            .render_and_send(
                to,
                "Welcome to Sylera",
                WelcomeText { name }.render(),
                WelcomeHtml { name }.render(),
            )
            .await;
        log_outcome("welcome", to, result);
    }

    async fn render_and_send(
        &self,
        to: &str,
        subject: &str,
        text: Result<String, askama::Error>,
        html: Result<String, askama::Error>,
    ) -> Result<(), NotifierError> {
        self.send_multipart(to, subject, &text?, &html?).await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), NotifierError> {
        let Some(mailer) = &self.mailer else {
            tracing::info!(to = %to, subject = %subject, "notifier disabled, not sending");
            return Ok(());
        };

        let email = Message::builder()
            .from(
                mailer
                    .from_address
                    .parse()
                    .map_err(|_| NotifierError::InvalidAddress(mailer.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| NotifierError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        mailer.transport.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

/// Delivery failures are logged, never surfaced to the triggering workflow.
fn log_outcome(kind: &str, to: &str, result: Result<(), NotifierError>) {
    if let Err(e) = result {
        tracing::warn!(kind = %kind, to = %to, error = %e, "notification failed");
    }
}
