use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "vault-cli")]
#[command(about = "Command-line client for the session vault API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token of the account to act as.
    #[arg(short, long, env = "VAULT_TOKEN")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Status,
    /// List session notes
    List {
        #[arg(long)]
        therapist: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show one note with its decrypted content
    Show { id: String },
    /// Document a session
    Create {
        #[arg(long)]
        appointment: String,
        #[command(flatten)]
        soap: Soap,
    },
    /// Replace the content of a note
    Update {
        id: String,
        /// Reject the edit if the note is no longer at this version
        #[arg(long)]
        expected_version: Option<u64>,
        #[command(flatten)]
        soap: Soap,
    },
}

#[derive(clap::Args)]
struct Soap {
    #[arg(long, default_value = "")]
    subjective: String,
    #[arg(long, default_value = "")]
    objective: String,
    #[arg(long, default_value = "")]
    assessment: String,
    #[arg(long, default_value = "")]
    plan: String,
}

impl Soap {
    fn to_json(&self) -> Value {
        json!({
            "subjective": self.subjective,
            "objective": self.objective,
            "assessment": self.assessment,
            "plan": self.plan,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/health", cli.url)),
        Commands::List { therapist, page } => {
            let mut query = vec![("page", page.to_string())];
            if let Some(t) = therapist {
                query.push(("therapist_id", t));
            }
            client.get(format!("{}/notes", cli.url)).query(&query)
        }
        Commands::Show { id } => client.get(format!("{}/notes/{}", cli.url, id)),
        Commands::Create { appointment, soap } => {
            let mut body = soap.to_json();
            body["appointment_id"] = json!(appointment);
            client.post(format!("{}/notes", cli.url)).json(&body)
        }
        Commands::Update {
            id,
            expected_version,
            soap,
        } => {
            let mut body = soap.to_json();
            if let Some(v) = expected_version {
                body["expected_version"] = json!(v);
            }
            client.put(format!("{}/notes/{}", cli.url, id)).json(&body)
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("{}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
