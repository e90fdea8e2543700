use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Client for the admission-control service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token from `login`.
    #[arg(short, long, env = "ADMISSION_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register { username: String, password: String },
    /// Exchange credentials for a token
    Login { username: String, password: String },
    /// Show the caller's profile
    Profile,
    /// Download a file from storage (written to stdout)
    Download { filename: String },
    /// Generate a report of N records
    Report { record_count: String },
    /// Fetch a profile picture from a URL
    FetchImage { image_url: String },
    /// Check host reachability (admin)
    VerifyHost { host: String },
    /// Queue a file for processing
    ScheduleTask { filename: String },
    /// Show a task
    TaskStatus { id: String },
    /// Post a comment to a topic
    Comment { topic_id: String, content: String },
    /// List a topic's comments
    Comments {
        topic_id: String,
        #[arg(long, default_value = "1")]
        page: String,
        #[arg(long)]
        per_page: Option<String>,
    },
    /// Delete a user (admin)
    DeleteUser { id: String },
    /// Service status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }
    let request = |method: Method, path: &str| -> RequestBuilder {
        client
            .request(method, format!("{}{}", cli.url, path))
            .headers(headers.clone())
    };

    let res = match &cli.command {
        Commands::Register { username, password } => {
            request(Method::POST, "/api/v1/auth/register")
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?
        }
        Commands::Login { username, password } => {
            request(Method::POST, "/api/v1/auth/login")
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?
        }
        Commands::Profile => request(Method::GET, "/api/v1/user/profile").send().await?,
        Commands::Download { filename } => {
            let res = request(Method::GET, "/api/v1/files/download")
                .query(&[("filename", filename)])
                .send()
                .await?;
            return print_raw(res).await;
        }
        Commands::Report { record_count } => {
            let res = request(Method::POST, "/api/v1/reports")
                .json(&json!({ "record_count": record_count }))
                .send()
                .await?;
            return print_raw(res).await;
        }
        Commands::FetchImage { image_url } => {
            request(Method::POST, "/api/v1/profile/picture")
                .json(&json!({ "image_url": image_url }))
                .send()
                .await?
        }
        Commands::VerifyHost { host } => {
            request(Method::POST, "/api/v1/diagnostics/verify")
                .json(&json!({ "target_host": host }))
                .send()
                .await?
        }
        Commands::ScheduleTask { filename } => {
            request(Method::POST, "/api/v1/tasks")
                .json(&json!({ "filename": filename }))
                .send()
                .await?
        }
        Commands::TaskStatus { id } => {
            request(Method::GET, &format!("/api/v1/tasks/{}", id))
                .send()
                .await?
        }
        Commands::Comment { topic_id, content } => {
            request(Method::POST, &format!("/api/v1/topics/{}/comments", topic_id))
                .json(&json!({ "content": content }))
                .send()
                .await?
        }
        Commands::Comments {
            topic_id,
            page,
            per_page,
        } => {
            let mut query = vec![("page", page)];
            if let Some(per_page) = per_page {
                query.push(("per_page", per_page));
            }
            request(Method::GET, &format!("/api/v1/topics/{}/comments", topic_id))
                .query(&query)
                .send()
                .await?
        }
        Commands::DeleteUser { id } => {
            request(Method::DELETE, &format!("/api/v1/admin/users/{}", id))
                .send()
                .await?
        }
        Commands::Status => request(Method::GET, "/api/v1/status").send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        return report_failure(res).await;
    }
    if status == reqwest::StatusCode::NO_CONTENT {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn print_raw(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    if !res.status().is_success() {
        return report_failure(res).await;
    }
    print!("{}", res.text().await?);
    Ok(())
}

async fn report_failure(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Error: service returned status {}", res.status());
    if let Ok(text) = res.text().await {
        eprintln!("Response: {}", text);
    }
    std::process::exit(1);
}
