use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use alcove_api::{ApiClient, ApiError, Session};
use alcove_client::{ConversationView, NotificationFeed};
use alcove_gateway::PushChannel;
use alcove_store::Store;
use alcove_store::models::StoredSession;
use alcove_types::api::{LoginRequest, RegisterRequest};
use alcove_types::events::ClientCommand;
use alcove_types::models::{COMMON_EMOJIS, MessageStatus, Presence, UserProfile};

struct Config {
    api_url: String,
    gateway_url: String,
    db_path: PathBuf,
}

impl Config {
    fn from_env() -> Result<Self> {
        let api_url =
            std::env::var("ALCOVE_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".into());
        let gateway_url = std::env::var("ALCOVE_GATEWAY_URL")
            .unwrap_or_else(|_| api_url.replacen("http", "ws", 1));
        let db_path = std::env::var("ALCOVE_DB_PATH").unwrap_or_else(|_| "alcove.db".into());
        Ok(Self {
            api_url,
            gateway_url,
            db_path: PathBuf::from(db_path),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alcove=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let store = Arc::new(Store::open(&config.db_path)?);
    let http = reqwest::Client::new();

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(session) = establish_session(&http, &config, &store, &mut input).await? else {
            return Ok(());
        };
        println!("Signed in as {}", session.user().full_name);

        if run_session(&http, &config, &store, session, &mut input).await? {
            return Ok(());
        }
        // Logged out: fall through to the login prompt again.
    }
}

/// Restore a persisted session, or walk the login/register prompts.
/// `None` means the user asked to quit.
async fn establish_session(
    http: &reqwest::Client,
    config: &Config,
    store: &Arc<Store>,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<Arc<Session>>> {
    if let Some(stored) = store.load_session()? {
        info!("restoring session for {}", stored.user.email);
        let session = Arc::new(Session::new(
            stored.user,
            stored.access_token,
            stored.refresh_token,
        ));
        // Verify the credentials with one authorized call before trusting them.
        let client = ApiClient::new(http.clone(), &config.api_url, session.clone());
        match client.fetch_users().await {
            Ok(_) => return Ok(Some(session)),
            Err(ApiError::SessionExpired) => {
                warn!("stored session expired, signing in again");
                store.clear_session()?;
            }
            Err(e) => anyhow::bail!("could not verify stored session: {}", e),
        }
    }

    loop {
        println!("Commands: login, register, quit");
        let Some(line) = prompt(input, "> ").await? else {
            return Ok(None);
        };
        match line.as_str() {
            "login" => {
                let Some(email) = prompt(input, "email: ").await? else {
                    return Ok(None);
                };
                let Some(password) = prompt(input, "password: ").await? else {
                    return Ok(None);
                };
                match alcove_api::auth::login(
                    http,
                    &config.api_url,
                    LoginRequest { email, password },
                )
                .await
                {
                    Ok(resp) => {
                        store.save_session(&StoredSession {
                            access_token: resp.access.clone(),
                            refresh_token: resp.refresh.clone(),
                            user: resp.user.clone(),
                        })?;
                        return Ok(Some(Arc::new(Session::new(
                            resp.user,
                            resp.access,
                            resp.refresh,
                        ))));
                    }
                    Err(e) => println!("Login failed: {}", e),
                }
            }
            "register" => {
                let Some(full_name) = prompt(input, "full name: ").await? else {
                    return Ok(None);
                };
                let Some(email) = prompt(input, "email: ").await? else {
                    return Ok(None);
                };
                let Some(password) = prompt(input, "password: ").await? else {
                    return Ok(None);
                };
                let Some(photo) = prompt(input, "photo path (blank for none): ").await? else {
                    return Ok(None);
                };
                let req = RegisterRequest {
                    email,
                    full_name,
                    password,
                    profile_photo: (!photo.is_empty()).then(|| PathBuf::from(photo)),
                };
                match alcove_api::auth::register(http, &config.api_url, req).await {
                    Ok(()) => println!("Account created. Log in to start chatting."),
                    Err(e) => println!("Registration failed: {}", e),
                }
            }
            "quit" => return Ok(None),
            other => println!("Unknown command: {}", other),
        }
    }
}

/// The signed-in command loop. Returns true to quit the program, false after
/// a logout.
async fn run_session(
    http: &reqwest::Client,
    config: &Config,
    store: &Arc<Store>,
    session: Arc<Session>,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<bool> {
    let persist = store.clone();
    let api = Arc::new(
        ApiClient::new(http.clone(), &config.api_url, session.clone()).with_refresh_listener(
            move |access| {
                if let Err(e) = persist.save_access_token(access) {
                    warn!("could not persist refreshed credential: {}", e);
                }
            },
        ),
    );

    let channel = PushChannel::connect(&config.gateway_url, &session.access_token())
        .await
        .context("could not open the push channel")?;

    let view = ConversationView::new(api.clone(), session.user().clone());
    view.set_adoption_listener(|conversation_id| {
        info!("conversation {} allocated", conversation_id);
    });

    let feed = {
        let commands = channel.command_sender();
        NotificationFeed::new(move |notification_ids| {
            if commands
                .send(ClientCommand::MarkSeen { notification_ids })
                .is_err()
            {
                warn!("push channel gone, mark_seen dropped");
            }
        })
    };

    // Pump push events into both controllers.
    let pump = {
        let view = view.clone();
        let feed = feed.clone();
        let mut events = channel.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                feed.apply(&event).await;
                view.handle_push(&event).await;
            }
        })
    };

    println!(
        "Commands: users, open <email>, <text>, react <n> <emoji>, emojis, \
         read <n>, select <n>, delete <n>, delete-selected, notifications, \
         seen <n|all>, logout, quit"
    );

    let quit = loop {
        let Some(line) = prompt(input, "> ").await? else {
            break true;
        };
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line.as_str(), ""),
        };

        match command {
            "users" => match api.fetch_users().await {
                Ok(users) => render_users(&users),
                Err(ApiError::SessionExpired) => break false,
                Err(e) => println!("Could not load users: {}", e),
            },
            "open" => match find_peer(&api, rest).await {
                Ok(Some(peer)) => {
                    view.select_peer(peer).await;
                    render_thread(&view, session.user_id()).await;
                }
                Ok(None) => println!("No user with email {}", rest),
                Err(ApiError::SessionExpired) => break false,
                Err(e) => println!("Could not load users: {}", e),
            },
            "react" => {
                let (index, emoji_arg) = match rest.split_once(' ') {
                    Some((i, e)) if !e.trim().is_empty() => (i, e.trim()),
                    _ => {
                        println!("Usage: react <n> <emoji or palette #> (see: emojis)");
                        continue;
                    }
                };
                // A number picks from the quick-pick palette.
                let emoji = match emoji_arg.parse::<usize>() {
                    Ok(k) => match COMMON_EMOJIS.get(k) {
                        Some(e) => *e,
                        None => {
                            println!("No palette emoji #{}", k);
                            continue;
                        }
                    },
                    Err(_) => emoji_arg,
                };
                if let Some(id) = resolve_message(&view, index).await {
                    view.toggle_reaction(&id, emoji).await;
                    render_thread(&view, session.user_id()).await;
                }
            }
            "emojis" => {
                for (k, emoji) in COMMON_EMOJIS.iter().enumerate() {
                    print!("{:>3} {}", k, emoji);
                    if (k + 1) % 8 == 0 {
                        println!();
                    }
                }
            }
            "read" => {
                if let Some(id) = resolve_message(&view, rest).await {
                    view.mark_read(&id).await;
                }
            }
            "select" => {
                if let Some(id) = resolve_message(&view, rest).await {
                    view.toggle_select(&id).await;
                }
            }
            "delete" => {
                if let Some(id) = resolve_message(&view, rest).await {
                    match view.delete_message(&id).await {
                        Ok(()) => render_thread(&view, session.user_id()).await,
                        Err(ApiError::SessionExpired) => break false,
                        Err(e) => println!("Delete failed: {}", e),
                    }
                }
            }
            "delete-selected" => match view.delete_selected().await {
                Ok(()) => render_thread(&view, session.user_id()).await,
                Err(ApiError::SessionExpired) => break false,
                Err(e) => println!("Batch delete failed: {}", e),
            },
            "notifications" => render_notifications(&feed).await,
            "seen" => {
                if rest == "all" {
                    feed.acknowledge_all().await;
                } else if let Some(id) = resolve_notification(&feed, rest).await {
                    feed.acknowledge(&id).await;
                }
            }
            "logout" => {
                store.clear_session()?;
                break false;
            }
            "quit" => break true,
            _ => {
                // Anything that isn't a command is a message to the open peer.
                match view.send(&line).await {
                    Ok(()) => render_thread(&view, session.user_id()).await,
                    Err(ApiError::SessionExpired) => break false,
                    Err(e) => println!("Send failed: {}", e),
                }
            }
        }
    };

    pump.abort();
    channel.close().await;
    Ok(quit)
}

async fn prompt(
    input: &mut Lines<BufReader<Stdin>>,
    label: &str,
) -> Result<Option<String>> {
    use std::io::Write;
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.map(|l| l.trim().to_string()))
}

async fn find_peer(api: &ApiClient, email: &str) -> Result<Option<UserProfile>, ApiError> {
    let users = api.fetch_users().await?;
    Ok(users.into_iter().find(|u| u.email == email))
}

async fn resolve_message(view: &ConversationView, index: &str) -> Option<String> {
    let Ok(index) = index.parse::<usize>() else {
        println!("Expected a message number");
        return None;
    };
    let snap = view.snapshot().await;
    match snap.messages.get(index) {
        Some(message) => Some(message.id.clone()),
        None => {
            println!("No message #{}", index);
            None
        }
    }
}

async fn resolve_notification(feed: &NotificationFeed, index: &str) -> Option<String> {
    let Ok(index) = index.parse::<usize>() else {
        println!("Expected a notification number");
        return None;
    };
    let entries = feed.entries().await;
    match entries.get(index) {
        Some(entry) => Some(entry.id.clone()),
        None => {
            println!("No notification #{}", index);
            None
        }
    }
}

fn render_users(users: &[UserProfile]) {
    if users.is_empty() {
        println!("Nobody else is registered yet.");
        return;
    }
    for user in users {
        let presence = match user.presence {
            Presence::Online => "online".to_string(),
            Presence::Offline => match &user.last_seen {
                Some(when) => format!("last seen {}", when),
                None => "offline".to_string(),
            },
        };
        let unread = match user.unread_count {
            Some(n) if n > 0 => format!("  [{} unread]", n),
            _ => String::new(),
        };
        println!("  {}  <{}>  ({}){}", user.full_name, user.email, presence, unread);
    }
}

async fn render_thread(view: &ConversationView, me: &str) {
    let snap = view.snapshot().await;
    let Some(peer) = &snap.peer else {
        println!("No conversation open. Use: open <email>");
        return;
    };

    println!("--- {} ---", peer.full_name);
    if let Some(error) = &snap.error {
        println!("  ! {}", error);
        return;
    }
    if snap.messages.is_empty() {
        println!("  (no messages yet)");
        return;
    }
    for (index, message) in snap.messages.iter().enumerate() {
        let who = if message.sender_id == me { "me" } else { peer.full_name.as_str() };
        let marker = if snap.selected.contains(&message.id) { "*" } else { " " };
        let status = match message.status {
            MessageStatus::Sent => "",
            MessageStatus::Delivered => " ✓",
            MessageStatus::Read => " ✓✓",
        };
        print!(
            "{}[{}] {} {}: {}{}",
            marker,
            index,
            message.timestamp.format("%b %-d, %-I:%M %p"),
            who,
            message.content,
            status
        );
        if !message.reactions.is_empty() {
            let emojis: Vec<&str> = message.reactions.iter().map(|r| r.emoji.as_str()).collect();
            print!("  {}", emojis.join(" "));
        }
        println!();
    }
}

async fn render_notifications(feed: &NotificationFeed) {
    let entries = feed.entries().await;
    if entries.is_empty() {
        println!("No notifications yet");
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        let what = match entry.kind {
            alcove_types::models::NotificationKind::NewMessage => "sent you a message",
            alcove_types::models::NotificationKind::Reaction => "reacted to your message",
        };
        let dot = if entry.unread { "•" } else { " " };
        println!("{} [{}] {} {} ({})", dot, index, entry.actor, what, entry.time_ago);
    }
}
