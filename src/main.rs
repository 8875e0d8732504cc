mod cli;

use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use clubhouse::api::{ApiError, Gateway};
use clubhouse::cache::{FetchOutcome, SnapshotStore};
use clubhouse::club::types::ReservationRequest;
use clubhouse::club::{compute_slots, ClubClient, ClubFeeds};
use clubhouse::config::Config;
use clubhouse::store::{KvStore, MemoryKvStore, Preferences, Session, SqliteKvStore};

#[derive(Parser, Debug)]
#[command(name = "clubhouse")]
#[command(about = "Club membership services from the command line")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/clubhouse/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Keep all state in memory for this run
  #[arg(long)]
  ephemeral: bool,

  /// Page size for list commands (overrides cache.page_size)
  #[arg(long, global = true)]
  limit: Option<u32>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in (password from --password or CLUBHOUSE_PASSWORD)
  Login {
    email: String,
    #[arg(long)]
    password: Option<String>,
  },
  /// Sign out and forget stored credentials
  Logout,
  /// Show the signed-in member
  Me,
  /// Browse club events
  Events {
    #[arg(short, long)]
    search: Option<String>,
    /// SPORT, SOCIAL, CULTURAL, KIDS, GASTRONOMY or Todos
    #[arg(long)]
    category: Option<String>,
    /// First day, YYYY-MM-DD
    #[arg(long)]
    from: Option<String>,
    /// Last day, YYYY-MM-DD
    #[arg(long)]
    to: Option<String>,
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    /// Ignore the cached page
    #[arg(short, long)]
    refresh: bool,
    /// Register for the event with this id
    #[arg(long)]
    register: Option<String>,
  },
  /// Read notifications
  Notifications {
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    unread: bool,
    #[arg(long)]
    kind: Option<String>,
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    #[arg(short, long)]
    refresh: bool,
    /// Mark everything as read first
    #[arg(long)]
    read_all: bool,
  },
  /// List shared club files
  Files {
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    folder: Option<String>,
    /// newest, oldest or name
    #[arg(long)]
    sort: Option<String>,
    /// Number of pages to load, appended into one list
    #[arg(long, default_value_t = 1)]
    pages: u32,
    #[arg(short, long)]
    refresh: bool,
  },
  /// Events and notifications side by side
  Dashboard,
  /// Show the access QR payload
  Qr,
  /// Account statements
  Statements {
    #[arg(long)]
    year: Option<i32>,
  },
  /// Open surveys
  Surveys,
  /// Free time slots of a facility
  Slots {
    facility: String,
    /// Day to check, YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<NaiveDate>,
  },
  /// Book a facility
  Reserve {
    facility: String,
    date: NaiveDate,
    /// HH:MM
    start: String,
    /// HH:MM
    end: String,
  },
  /// Show or change local preferences
  Prefs {
    #[arg(long)]
    theme: Option<String>,
    #[arg(long)]
    language: Option<String>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;
  if let Some(limit) = args.limit.filter(|l| *l > 0) {
    config.cache.page_size = limit;
  }
  let _log_guard = clubhouse::logging::init(&config.logging)?;

  let store: Arc<dyn KvStore> = if args.ephemeral {
    Arc::new(MemoryKvStore::new())
  } else {
    match &config.storage.path {
      Some(path) => Arc::new(SqliteKvStore::open(path)?),
      None => Arc::new(SqliteKvStore::open_default()?),
    }
  };

  let mut session = Session::new(store.clone());
  if let Some(token) = Config::env_token() {
    session = session.with_token(token);
  }

  let gateway = Gateway::new(&config.api, session)?;
  gateway.set_unauthorized_handler(Arc::new(|| {
    eprintln!("Session expired. Run `clubhouse login` to sign in again.");
  }));
  let client = ClubClient::new(gateway, store.clone());

  let snapshots = config
    .cache
    .snapshots
    .then(|| SnapshotStore::new(store.clone()));
  let feeds = ClubFeeds::new(&config.cache, snapshots);

  info!(version = env!("CARGO_PKG_VERSION"), "starting");
  run(args.command, &client, &feeds, Preferences::new(store)).await
}

async fn run(
  command: Command,
  client: &ClubClient,
  feeds: &ClubFeeds,
  prefs: Preferences,
) -> Result<()> {
  match command {
    Command::Login { email, password } => {
      let password = match password {
        Some(p) => p,
        None => std::env::var("CLUBHOUSE_PASSWORD").map_err(|_| {
          eyre!("Password not given. Pass --password or set CLUBHOUSE_PASSWORD.")
        })?,
      };
      let member = client.login(&email, &password).await.map_err(report)?;
      println!("Welcome, {} (member {})", member.full_name(), member.member_number);
    }

    Command::Logout => {
      match client.logout().await {
        Ok(()) => {}
        Err(e) => eprintln!("! {}", cli::error_banner(&e)),
      }
      println!("Signed out.");
    }

    Command::Me => {
      let member = client.me().await.map_err(report)?;
      println!("{}", member.full_name());
      println!("member #{}  {}", member.member_number, member.email);
      if let Some(kind) = member.membership_type {
        println!("membership: {}", kind);
      }
    }

    Command::Events {
      search,
      category,
      from,
      to,
      page,
      refresh,
      register,
    } => {
      let mut force = refresh;
      if let Some(id) = register {
        let message = client.register_for_event(&id).await.map_err(report)?;
        println!("{}", message.unwrap_or_else(|| "Registered.".to_string()));
        // Seat counts changed
        force = true;
      }

      feeds.events.with(|c| -> Result<()> {
        apply_filter(c, "search", search)?;
        apply_filter(c, "category", category)?;
        apply_filter(c, "dateFrom", from)?;
        apply_filter(c, "dateTo", to)?;
        c.set_page(page);
        Ok(())
      })?;
      feeds.events.restore_snapshot();
      feeds.load_events(client, force).await;
      let out = feeds
        .events
        .with(|c| cli::render_list("Events", c, cli::event_row));
      print!("{}", out);
    }

    Command::Notifications {
      search,
      unread,
      kind,
      page,
      refresh,
      read_all,
    } => {
      let mut force = refresh;
      if read_all {
        client.mark_all_notifications_read().await.map_err(report)?;
        force = true;
      }

      feeds.notifications.with(|c| -> Result<()> {
        apply_filter(c, "search", search)?;
        apply_filter(c, "kind", kind)?;
        if unread {
          c.set_filter("unreadOnly", "true")?;
        }
        c.set_page(page);
        Ok(())
      })?;
      feeds.notifications.restore_snapshot();
      feeds.load_notifications(client, force).await;
      let out = feeds
        .notifications
        .with(|c| cli::render_list("Notifications", c, cli::notification_row));
      print!("{}", out);
    }

    Command::Files {
      search,
      folder,
      sort,
      pages,
      refresh,
    } => {
      feeds.files.with(|c| -> Result<()> {
        apply_filter(c, "search", search)?;
        apply_filter(c, "folder", folder)?;
        apply_filter(c, "sort", sort)?;
        Ok(())
      })?;

      let mut outcome = feeds.load_files(client, refresh).await;
      for _ in 1..pages.max(1) {
        if matches!(outcome, FetchOutcome::Failed(_)) || !feeds.files.with(|c| c.next_page()) {
          break;
        }
        outcome = feeds.load_files(client, refresh).await;
      }
      let out = feeds
        .files
        .with(|c| cli::render_list("Files", c, cli::file_row));
      print!("{}", out);
    }

    Command::Dashboard => {
      feeds.restore_snapshots();
      futures::join!(
        feeds.load_events(client, false),
        feeds.load_notifications(client, false)
      );
      let events = feeds
        .events
        .with(|c| cli::render_list("Upcoming events", c, cli::event_row));
      let notifications = feeds
        .notifications
        .with(|c| cli::render_list("Notifications", c, cli::notification_row));
      println!("{}\n{}", events, notifications);
    }

    Command::Qr => {
      let result = client.access_code().await.map_err(report)?;
      if result.from_cache {
        println!("(offline, showing the last downloaded code)");
      }
      println!("{}", result.code.payload);
      if let Some(expires) = result.code.expires_at {
        println!("valid until {}", expires.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
      }
    }

    Command::Statements { year } => {
      let statements = client.list_statements(year).await.map_err(report)?;
      if statements.is_empty() {
        println!("No statements.");
      }
      for s in &statements {
        println!("{}", cli::statement_row(s));
      }
    }

    Command::Surveys => {
      let surveys = client.list_surveys().await.map_err(report)?;
      for s in surveys.iter().filter(|s| !s.answered) {
        println!("{}  {} ({} questions)", s.id, s.title, s.questions.len());
      }
    }

    Command::Slots { facility, date } => {
      let date = date.unwrap_or_else(|| Local::now().date_naive());
      let schedule = client
        .facility_schedule(&facility, date)
        .await
        .map_err(report)?;
      println!("{} on {}", schedule.facility.name, date);
      let slots = compute_slots(
        &schedule.facility,
        date,
        &schedule.reservations,
        Local::now().naive_local(),
      );
      if slots.is_empty() {
        println!("  no bookable slots");
      }
      for slot in &slots {
        println!("  {}", cli::slot_row(slot));
      }
    }

    Command::Reserve {
      facility,
      date,
      start,
      end,
    } => {
      let request = ReservationRequest {
        facility_id: facility,
        date,
        starts_at: parse_time(&start)?,
        ends_at: parse_time(&end)?,
        guests: None,
      };
      if request.ends_at <= request.starts_at {
        return Err(eyre!("The reservation must end after it starts"));
      }
      let reservation = client.create_reservation(&request).await.map_err(report)?;
      println!(
        "Reserved {} {}-{} (#{})",
        reservation.date,
        reservation.starts_at.format("%H:%M"),
        reservation.ends_at.format("%H:%M"),
        reservation.id
      );
    }

    Command::Prefs { theme, language } => {
      if let Some(theme) = theme {
        prefs.set_theme(theme.parse()?)?;
      }
      if let Some(language) = language {
        prefs.set_language(language.parse()?)?;
      }
      println!("theme: {}", prefs.theme()?);
      println!("language: {}", prefs.language()?);
      let n = prefs.notifications()?;
      println!(
        "notifications: push={} events={} reservations={} statements={} promotions={}",
        n.push_enabled, n.events, n.reservations, n.statements, n.promotions
      );
    }
  }

  Ok(())
}

fn apply_filter<F, T>(
  cache: &mut clubhouse::cache::ListCache<F, T>,
  name: &str,
  value: Option<String>,
) -> Result<()>
where
  F: clubhouse::cache::ListFilters,
  T: clubhouse::cache::Cacheable,
{
  if let Some(value) = value {
    cache.set_filter(name, &value)?;
  }
  Ok(())
}

fn parse_time(value: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(value, "%H:%M")
    .map_err(|_| eyre!("Invalid time '{}', expected HH:MM", value))
}

/// Turn an API error into the report printed on exit.
fn report(err: ApiError) -> color_eyre::Report {
  eyre!("{}", cli::error_banner(&err))
}
