use {
    crate::{error::Error, model::Rsvp},
    lettre::{
        message::{header::ContentType, Attachment, Message, MessageBuilder, MultiPart, SinglePart},
        transport::stub::AsyncStubTransport,
        AsyncSendmailTransport, AsyncTransport, Tokio1Executor,
    },
    log::{error, info},
};

/// Mails the admins on every new RSVP
#[derive(Clone, Debug, Default)]
pub struct Email {
    pub from: String,
    pub admins: Vec<String>,
    /// Log messages through the stub transport instead of sending them
    pub test: bool,
}

impl Email {
    pub fn new(from: &str, admins: &[String], test: bool) -> Self {
        Self {
            from: from.to_string(),
            admins: admins.to_vec(),
            test,
        }
    }

    async fn send_message(&self, message: Message) -> Result<(), Error> {
        if self.test {
            info!("Sending message: {:?}", message);
            let sender = AsyncStubTransport::new_ok();
            sender.send(message).await.map_err(Error::from)
        } else {
            let sender = AsyncSendmailTransport::<Tokio1Executor>::new();
            sender.send(message).await.map_err(Error::from)
        }
    }

    fn builder(&self) -> Result<MessageBuilder, Error> {
        let mut builder = Message::builder()
            .from(self.from.parse()?)
            .reply_to(self.from.parse()?);
        for admin in &self.admins {
            builder = builder.to(admin.parse()?);
        }
        Ok(builder)
    }

    pub(crate) fn rsvp_email(&self, rsvp: &Rsvp, csv_contents: String) -> Result<Message, Error> {
        let answer = if rsvp.is_attending {
            "will attend"
        } else {
            "will not attend"
        };
        let csv_type =
            ContentType::parse("text/csv").map_err(|error| Error::Email(error.to_string()))?;
        self.builder()?
            .subject(format!("New RSVP from {}", rsvp.guest_name))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(format!(
                        "{} {}.\n{}",
                        rsvp.guest_name,
                        answer,
                        serde_json::to_string(rsvp).map_err(|e| Error::Email(e.to_string()))?
                    )))
                    .singlepart(
                        Attachment::new("guests.csv".to_string()).body(csv_contents, csv_type),
                    ),
            )
            .map_err(Error::from)
    }

    pub async fn send_rsvp(&self, rsvp: &Rsvp, csv_contents: String) -> Result<(), Error> {
        let message = self.rsvp_email(rsvp, csv_contents)?;
        self.send_message(message).await
    }
}

/// Failures are only logged; the RSVP itself has already been stored.
pub async fn notify_rsvp(email: &Email, rsvp: &Rsvp, csv_contents: Result<String, Error>) {
    let result = match csv_contents {
        Ok(contents) => email.send_rsvp(rsvp, contents).await,
        Err(error) => Err(error),
    };
    if let Err(error) = result {
        error!("Could not send RSVP notification for {}: {}", rsvp.guest_name, error);
    }
}
