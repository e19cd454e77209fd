//! Subcommand implementations. Each one plays the part of a page in the web
//! front end: it calls into the auth context and prints the outcome.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{error, warn};

use flowmeld_core::api::ApiError;
use flowmeld_core::auth::TokenClaims;
use flowmeld_core::{AccentColor, AuthContext, Config, Route, SessionEvent, Task, Theme};

/// Environment variable holding the password for non-interactive logins
const PASSWORD_ENV: &str = "FLOWMELD_PASSWORD";

pub async fn login(context: &AuthContext, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompt_username(config.last_username.as_deref())?,
    };
    if username.is_empty() {
        bail!("Username is required");
    }
    let password = read_password()?;

    if let Err(e) = context.login_with_password(&username, &password).await {
        error!(error = %e, "Login failed");
        bail!(e.user_message());
    }

    config.last_username = Some(username.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    let name = context
        .fetch_user()
        .await
        .map(|user| user.display_name().to_string())
        .unwrap_or(username);
    println!("Welcome back, {}!", name);
    Ok(())
}

pub async fn register(context: &AuthContext, username: &str, email: &str) -> Result<()> {
    let password = read_password()?;
    match context.register(username, email, &password).await {
        Ok(user) => {
            println!("Registration successful for {}. Run `flowmeld login` to sign in.", user.username);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Registration failed");
            bail!(e.user_message())
        }
    }
}

pub async fn logout(context: &AuthContext) -> Result<()> {
    context.logout().await;
    Ok(())
}

pub async fn refresh(context: &AuthContext) -> Result<()> {
    match context.renew().await {
        Ok(()) => {
            println!("Access token renewed.");
            Ok(())
        }
        Err(e) if e.is_unauthorized() => bail!("Your session has expired. Please log in again."),
        Err(e) => Err(request_failed(e)),
    }
}

pub async fn whoami(context: &AuthContext) -> Result<()> {
    match context.fetch_user().await {
        Some(user) if user.email.is_empty() => println!("{}", user.username),
        Some(user) => println!("{} <{}>", user.username, user.email),
        None => println!("Not logged in"),
    }
    Ok(())
}

pub async fn status(context: &AuthContext, config: &Config) -> Result<()> {
    let session = context.snapshot().await;

    println!("API:          {}", config.base_url());
    println!("Storage:      {:?}", config.storage);
    println!("Theme:        {}", session.theme);
    println!("Accent color: {}", session.accent_color);

    let Some(ref access) = session.access_token else {
        println!("Session:      anonymous");
        return Ok(());
    };
    println!("Session:      authenticated");

    match TokenClaims::decode(access) {
        Ok(claims) => match claims.expires_at() {
            Some(at) if claims.is_expired(Utc::now()) => {
                println!("Access token: expired at {} (renewed on next request)", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
            }
            Some(at) => {
                let minutes = claims.minutes_until_expiry(Utc::now()).unwrap_or(0);
                println!("Access token: expires {} ({}m left)", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"), minutes);
            }
            None => println!("Access token: no expiry"),
        },
        Err(e) => warn!(error = %e, "Access token is not a readable JWT"),
    }

    match context.api().verify(access).await {
        Ok(valid) => println!("Server check: {}", if valid { "valid" } else { "rejected" }),
        Err(e) => println!("Server check: {}", e.user_message()),
    }
    Ok(())
}

pub async fn theme(context: &AuthContext, theme: Option<Theme>) -> Result<()> {
    let theme = match theme {
        Some(theme) => theme,
        None => context.snapshot().await.theme.toggled(),
    };
    context.set_theme(theme).await;
    println!("Theme: {}", theme);
    Ok(())
}

pub async fn accent(context: &AuthContext, color: Option<AccentColor>) -> Result<()> {
    match color {
        Some(color) => {
            context.set_accent_color(color).await;
            println!("Accent color: {}", color);
        }
        None => {
            let current = context.snapshot().await.accent_color;
            for color in AccentColor::ALL {
                let marker = if color == current { "*" } else { " " };
                println!("{} {}", marker, color);
            }
        }
    }
    Ok(())
}

pub async fn dashboard(context: &AuthContext) -> Result<()> {
    let name = require_session(context).await?;
    let dashboard = context.api().dashboard().await.map_err(request_failed)?;

    println!("Welcome, {}!\n", name);
    match dashboard.persona {
        Some(ref persona) if !persona.is_pending() => {
            println!("Persona: {}\n", persona.ai_generated_persona_summary)
        }
        Some(_) => println!("Persona: being generated\n"),
        None => println!("Persona: not created yet\n"),
    }

    let active: Vec<&Task> = dashboard.active_tasks().collect();
    println!("Active tasks ({} of {}):", active.len(), dashboard.tasks.len());
    for task in active {
        print_task(task);
    }
    Ok(())
}

pub async fn tasks(context: &AuthContext) -> Result<()> {
    require_session(context).await?;
    let tasks = context.api().tasks().await.map_err(request_failed)?;
    if tasks.is_empty() {
        println!("No tasks yet.");
    }
    for task in &tasks {
        print_task(task);
    }
    Ok(())
}

pub async fn persona(context: &AuthContext) -> Result<()> {
    require_session(context).await?;
    let personas = context.api().personas().await.map_err(request_failed)?;
    let Some(persona) = personas.into_iter().next() else {
        println!("No persona yet.");
        return Ok(());
    };

    if persona.is_pending() {
        println!("Your persona is still being generated.");
    } else {
        println!("{}", persona.ai_generated_persona_summary);
        if !persona.ai_personality_traits.is_empty() {
            println!("\nTraits: {}", persona.ai_personality_traits);
        }
    }
    if !persona.goals_input.is_empty() {
        println!("\nGoals: {}", persona.goals_input);
    }
    Ok(())
}

pub async fn suggestions(context: &AuthContext) -> Result<()> {
    require_session(context).await?;
    let plan = context.api().daily_suggestions().await.map_err(request_failed)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

/// Print what the session transitions during this run mean for the user.
pub fn report_navigation(events: &mut broadcast::Receiver<SessionEvent>) {
    if final_route(events) == Some(Route::Login) {
        println!("Signed out. Run `flowmeld login` to sign in again.");
    }
}

/// Route the last pending transition leads to, if anything happened.
fn final_route(events: &mut broadcast::Receiver<SessionEvent>) -> Option<Route> {
    let mut last = None;
    loop {
        match events.try_recv() {
            Ok(event) => last = Some(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    last.map(|event| event.route())
}

/// Protected commands need a session; returns the name to greet.
async fn require_session(context: &AuthContext) -> Result<String> {
    let authenticated = context.session().is_authenticated().await;
    if Route::Dashboard.resolve(authenticated) == Route::Login {
        bail!("Not logged in. Run `flowmeld login` first.");
    }
    match context.fetch_user().await {
        Some(user) => Ok(user.display_name().to_string()),
        None => bail!("Your session has expired. Please log in again."),
    }
}

fn request_failed(e: ApiError) -> anyhow::Error {
    error!(error = %e, "Request failed");
    anyhow::anyhow!(e.user_message())
}

fn print_task(task: &Task) {
    let due = task
        .due_date
        .map(|d| format!(" due {}", d.with_timezone(&Local).format("%b %d %H:%M")))
        .unwrap_or_default();
    let overdue = if task.is_overdue(Utc::now()) { " (overdue)" } else { "" };
    println!(
        "  [{:<11}] {:<8} {}{}{}",
        task.status.display_name(),
        task.ai_suggested_priority.display_name(),
        task.title,
        due,
        overdue
    );
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(resolve_username(&input, last))
}

/// An empty answer reuses the last username.
fn resolve_username(input: &str, last: Option<&str>) -> String {
    let input = input.trim();
    match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    }
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    rpassword::prompt_password("Password: ").context("Failed to read password")
}
