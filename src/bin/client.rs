use {
    awc::{http::StatusCode, Client},
    clap::{Parser, Subcommand},
    invite_rsvp::model::{AddGuestParams, Guest, Rsvp, RsvpStats},
    serde::de::DeserializeOwned,
    serde_json::Value,
};

/// Admin client for the RSVP API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL hosting the RSVP API
    #[arg(short, long, default_value_t = String::from("http://127.0.0.1:8080"))]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Invite a new guest and print their invite code
    Add {
        /// New guest's name
        name: String,
    },
    /// List all guests
    List,
    /// List all RSVPs
    Rsvps,
    /// Show attendance counts
    Stats,
    /// Delete a guest and their RSVP
    Delete {
        /// Guest id
        id: String,
    },
    /// Delete every guest and RSVP
    Clear,
}

/// Sends the request and decodes the JSON reply
macro_rules! read {
    ($request:expr) => {{
        let mut response = $request.await.map_err(|e| e.to_string())?;
        let status = response.status();
        let body: Value = response.json().await.map_err(|e| e.to_string())?;
        decode(status, body)?
    }};
}

/// Turns the API's `{error}` body into an error
fn decode<T: DeserializeOwned>(status: StatusCode, body: Value) -> Result<T, String> {
    if !status.is_success() {
        let message = body["error"].as_str().unwrap_or("unknown error");
        return Err(format!("{}: {}", status, message));
    }
    serde_json::from_value(body).map_err(|e| e.to_string())
}

async fn run(client: &Client, url: &str, command: Command) -> Result<(), String> {
    let api = format!("{}/api", url.trim_end_matches('/'));
    match command {
        Command::Add { name } => {
            let params = AddGuestParams { name: Some(name) };
            let guest: Guest = read!(client
                .post(format!("{}/guests", api))
                .send_json(&params));
            println!("Added {} with invite code {}", guest.name, guest.invite_code);
            println!("Invite link: {}/invite/{}", url.trim_end_matches('/'), guest.invite_code);
        }
        Command::List => {
            let guests: Vec<Guest> = read!(client
                .get(format!("{}/guests", api))
                .send());
            for guest in guests {
                println!("{}\t{}\t{}", guest.id, guest.invite_code, guest.name);
            }
        }
        Command::Rsvps => {
            let rsvps: Vec<Rsvp> = read!(client
                .get(format!("{}/rsvp", api))
                .send());
            for rsvp in rsvps {
                let answer = if rsvp.is_attending { "yes" } else { "no" };
                println!("{}\t{}\t{}", rsvp.guest_name, answer, rsvp.submitted_at);
            }
        }
        Command::Stats => {
            let stats: RsvpStats = read!(client
                .get(format!("{}/rsvp?stats=true", api))
                .send());
            println!("Guests:        {}", stats.total_guests);
            println!("Responses:     {}", stats.total_rsvps);
            println!("Attending:     {}", stats.attending_count);
            println!("Not attending: {}", stats.not_attending_count);
            println!("Pending:       {}", stats.pending_count);
        }
        Command::Delete { id } => {
            let body: Value = read!(client
                .delete(format!("{}/guests/{}", api, id))
                .send());
            println!("{}", body["message"].as_str().unwrap_or("Deleted"));
        }
        Command::Clear => {
            let body: Value = read!(client
                .delete(format!("{}/guests", api))
                .send());
            println!("{}", body["message"].as_str().unwrap_or("Cleared"));
        }
    }
    Ok(())
}

#[actix_web::main]
async fn main() {
    let args = Args::parse();
    let client = Client::default();
    if let Err(error) = run(&client, &args.url, args.command).await {
        eprintln!("Request failed: {}", error);
        std::process::exit(1);
    }
}
