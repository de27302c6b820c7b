use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sondaj::backend::identity::{MemoryIdentity, PopupOutcome};
use sondaj::backend::memory::{DataFile, DataFileError, MemoryStore};
use sondaj::backend::storage::{MemoryBlobStorage, UploadProgress};
use sondaj::backend::{DocumentStore, StoreError};
use sondaj::config::{AppConfig, ConfigError};
use sondaj::consent::{FileKeyValue, KeyValueStore, MemoryKeyValue};
use sondaj::rich_text::summary;
use sondaj::services::session::load_profile;
use sondaj::share::PrintShareSheet;
use sondaj::types::{Category, CommentOrder, ImageInput, ImageUpload, PollDraft, User};
use sondaj::util::format_ms;
use sondaj::{AppContext, AppError, AppProvider, Backends};
use tracing::{debug, info};
use url::Url;

const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    DataFile(#[from] DataFileError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    App(#[from] AppError),
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("no poll matches `{0}`")]
    UnknownPoll(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}

#[derive(Parser, Debug)]
#[command(name = "sondaj", about = "Public opinion polls: vote, comment, react")]
struct Cli {
    /// JSON or YAML file holding every collection.
    #[arg(long, env = "SONDAJ_DATA_FILE", default_value = "sondaje.json")]
    data: PathBuf,

    /// Act as this user id (profile read from `users/{uid}`).
    #[arg(long, env = "SONDAJ_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List polls, optionally one category only.
    List {
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,
    },
    Show {
        poll: String,
    },
    Vote {
        poll: String,
        #[arg(value_enum)]
        choice: VoteArg,
    },
    Comment {
        poll: String,
        text: String,
    },
    React {
        poll: String,
        comment: String,
        #[arg(value_enum)]
        reaction: ReactionArg,
    },
    Comments {
        poll: String,
        #[arg(long, value_enum, default_value_t = OrderArg::Newest)]
        order: OrderArg,
        /// Show at least this many comments.
        #[arg(long)]
        limit: Option<u32>,
    },
    AddPoll(AddPollArgs),
    /// Change a poll; fields not given keep their current value.
    EditPoll(EditPollArgs),
    DeletePoll {
        poll: String,
    },
    Share {
        poll: String,
    },
    /// Restore the view a page URL describes.
    OpenUrl {
        url: String,
    },
    /// Accept the terms and conditions.
    Agree,
}

#[derive(Args, Debug)]
struct AddPollArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    position: String,
    #[arg(long, default_value = "")]
    details: String,
    #[arg(long, default_value = "")]
    source: String,
    #[arg(long, value_enum, default_value_t = CategoryArg::Persoana)]
    category: CategoryArg,
    /// Image file to upload.
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EditPollArgs {
    poll: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    position: Option<String>,
    #[arg(long)]
    details: Option<String>,
    #[arg(long)]
    source: Option<String>,
    #[arg(long, value_enum)]
    category: Option<CategoryArg>,
    /// Replacement image file.
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CategoryArg {
    Persoana,
    Partid,
    Lege,
    Altele,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Persoana => Self::Person,
            CategoryArg::Partid => Self::Party,
            CategoryArg::Lege => Self::Law,
            CategoryArg::Altele => Self::Other,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum VoteArg {
    Up,
    Down,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReactionArg {
    Like,
    Dislike,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OrderArg {
    Newest,
    Oldest,
    Top,
}

impl From<OrderArg> for CommentOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Newest => Self::NEWEST,
            OrderArg::Oldest => Self::OLDEST,
            OrderArg::Top => Self::TOP,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let store = MemoryStore::from_data_file(DataFile::load(&cli.data)?);
    let user = match cli.user.as_deref() {
        Some(uid) => Some(resolve_user(&store, uid).await?),
        None => None,
    };

    let prefs: Arc<dyn KeyValueStore> = match &config.consent_file {
        Some(path) => Arc::new(FileKeyValue::new(path)),
        None => {
            debug!("no consent file configured; terms count as accepted");
            Arc::new(MemoryKeyValue::agreed())
        }
    };
    let identity = MemoryIdentity::new();
    let backends = Backends {
        store: Arc::new(store.clone()),
        identity: Arc::new(identity.clone()),
        blobs: Arc::new(MemoryBlobStorage::new()),
        prefs,
    };
    let provider = AppProvider::new(AppContext::new(config, backends));
    let ctx = provider.require("sondaj-cli").map_err(AppError::from)?;

    ctx.start().await?;
    if !ctx.wait_until(|s| s.polls_loaded, LOAD_TIMEOUT).await {
        return Err(CliError::Timeout("the poll list"));
    }
    if let Some(user) = user {
        identity.set_popup(PopupOutcome::SignIn(user));
        ctx.sign_in().await?;
    }

    let result = run(&ctx, cli.command).await;

    print_notices(&ctx).await;
    ctx.shutdown().await;
    store.export().save(&cli.data)?;
    info!(path = %cli.data.display(), "data file saved");
    result
}

async fn run(ctx: &Arc<AppContext>, command: Command) -> Result<(), CliError> {
    match command {
        Command::List { category } => run_list(ctx, category.map(Category::from)).await,
        Command::Show { poll } => run_show(ctx, &poll).await,
        Command::Vote { poll, choice } => {
            let poll_id = resolve_poll(ctx, &poll).await?;
            ctx.cast_vote(&poll_id, matches!(choice, VoteArg::Up)).await?;
            Ok(())
        }
        Command::Comment { poll, text } => {
            let poll_id = resolve_poll(ctx, &poll).await?;
            let id = ctx.add_new_comment(&poll_id, &text).await?;
            println!("{id}");
            Ok(())
        }
        Command::React { poll, comment, reaction } => {
            let poll_id = resolve_poll(ctx, &poll).await?;
            let like = matches!(reaction, ReactionArg::Like);
            let update = ctx.update_comment_like_dislike(&poll_id, &comment, like).await?;
            println!("upvotes: {}", update.upvotes_count);
            Ok(())
        }
        Command::Comments { poll, order, limit } => run_comments(ctx, &poll, order, limit).await,
        Command::AddPoll(args) => run_add_poll(ctx, args).await,
        Command::EditPoll(args) => run_edit_poll(ctx, args).await,
        Command::DeletePoll { poll } => {
            let poll_id = resolve_poll(ctx, &poll).await?;
            ctx.delete_poll(&poll_id).await?;
            Ok(())
        }
        Command::Share { poll } => {
            let poll_id = resolve_poll(ctx, &poll).await?;
            ctx.share_poll(&poll_id, &PrintShareSheet).await?;
            Ok(())
        }
        Command::OpenUrl { url } => {
            ctx.restore_from_url(Url::parse(&url)?).await?;
            print_view(ctx).await;
            Ok(())
        }
        Command::Agree => {
            ctx.agree_terms().await?;
            print_view(ctx).await;
            Ok(())
        }
    }
}

async fn run_list(ctx: &AppContext, category: Option<Category>) -> Result<(), CliError> {
    let categories = match category {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };
    for category in categories {
        let polls = ctx.polls_in(category).await;
        if polls.is_empty() {
            continue;
        }
        println!("== {} ==", category.label());
        for poll in polls {
            println!("{}\t{}", poll.id, poll.title());
        }
    }
    Ok(())
}

async fn run_show(ctx: &Arc<AppContext>, poll: &str) -> Result<(), CliError> {
    let poll_id = resolve_poll(ctx, poll).await?;
    ctx.open_poll(&poll_id).await?;
    wait_for_comments(ctx, &poll_id).await?;
    let signed_in = ctx.current_user().is_some();
    if signed_in {
        let id = poll_id.clone();
        if !ctx.wait_until(move |s| s.polls.get(&id).is_some_and(|p| p.votes.is_some()), LOAD_TIMEOUT).await {
            return Err(CliError::Timeout("votes"));
        }
    }

    let state = ctx.snapshot().await;
    let Some(poll) = state.polls.get(&poll_id) else {
        return Err(CliError::UnknownPoll(poll_id));
    };
    println!("{}", poll.title());
    println!("{}", summary(&poll.details));
    if let Some(source) = poll.source() {
        println!("sursa: {source}");
    }
    println!("actualizat: {}", format_ms(poll.last_modified()));
    if signed_in {
        let votes = ctx.vote_summary(&poll_id).await;
        let mine = match votes.my_choice {
            Some(true) => " (ai votat pentru)",
            Some(false) => " (ai votat impotriva)",
            None => "",
        };
        println!("{}% pentru, {} voturi{mine}", votes.tally.percent, votes.tally.total);
    }
    println!("{} comentarii", ctx.comments_view(&poll_id).await.total);
    Ok(())
}

async fn run_comments(
    ctx: &Arc<AppContext>,
    poll: &str,
    order: OrderArg,
    limit: Option<u32>,
) -> Result<(), CliError> {
    let poll_id = resolve_poll(ctx, poll).await?;
    ctx.open_poll(&poll_id).await?;
    if order != OrderArg::Newest {
        ctx.change_comments_order(order.into()).await?;
    }
    let page = ctx.config().comments_page_size;
    if let Some(extra) = limit.and_then(|limit| limit.checked_sub(page)).filter(|n| *n > 0) {
        ctx.update_comments_limit(&poll_id, Some(extra)).await?;
    }
    wait_for_comments(ctx, &poll_id).await?;

    let view = ctx.comments_view(&poll_id).await;
    for item in &view.comments {
        let comment = &item.comment;
        println!(
            "[{}] {} ({}) +{} -{}",
            comment.id,
            comment.author(),
            format_ms(comment.timestamp),
            item.reactions.likes,
            item.reactions.dislikes,
        );
        if item.collapsed {
            println!("    (ascuns: prea multe voturi negative)");
        } else {
            println!("    {}", comment.text);
        }
    }
    println!("{} din {}", view.visible, view.total);
    if view.can_load_more {
        println!("mai multe: --limit {}", view.visible as u64 + u64::from(page));
    }
    Ok(())
}

async fn run_add_poll(ctx: &AppContext, args: AddPollArgs) -> Result<(), CliError> {
    ctx.open_add_poll().await?;
    let image = match &args.image {
        Some(path) => Some(ImageInput::Upload(read_image(path)?)),
        None => None,
    };
    let draft = PollDraft {
        name: args.name,
        position: args.position,
        details: args.details,
        source: args.source,
        category: args.category.into(),
    };
    let progress = |p: UploadProgress| debug!(percent = p.percent(), "uploading image");
    let id = ctx.save_poll(None, &draft, image, &progress).await?;
    println!("{id}");
    Ok(())
}

async fn run_edit_poll(ctx: &AppContext, args: EditPollArgs) -> Result<(), CliError> {
    let poll_id = resolve_poll(ctx, &args.poll).await?;
    let (mut draft, mut image) = ctx.open_edit_poll(&poll_id).await?;
    if let Some(name) = args.name {
        draft.name = name;
    }
    if let Some(position) = args.position {
        draft.position = position;
    }
    if let Some(details) = args.details {
        draft.details = details;
    }
    if let Some(source) = args.source {
        draft.source = source;
    }
    if let Some(category) = args.category {
        draft.category = category.into();
    }
    if let Some(path) = &args.image {
        image = Some(ImageInput::Upload(read_image(path)?));
    }
    let progress = |p: UploadProgress| debug!(percent = p.percent(), "uploading image");
    ctx.save_poll(Some(&poll_id), &draft, image, &progress).await?;
    Ok(())
}

fn read_image(path: &Path) -> Result<ImageUpload, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_string(), |name| name.to_string_lossy().into_owned());
    let content_type = match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(ImageUpload { file_name, content_type: content_type.to_string(), bytes })
}

/// Profile stored for `uid`, or a bare user when there is none.
async fn resolve_user(store: &dyn DocumentStore, uid: &str) -> Result<User, CliError> {
    Ok(load_profile(store, uid)
        .await?
        .unwrap_or_else(|| User { uid: uid.to_string(), ..User::default() }))
}

/// Accept a poll id or a URL slug of its name.
async fn resolve_poll(ctx: &AppContext, poll: &str) -> Result<String, CliError> {
    let found = ctx
        .state()
        .read(|s| s.polls.get(poll).or_else(|| s.polls.find_by_slug(poll)).map(|p| p.id.clone()))
        .await;
    found.ok_or_else(|| CliError::UnknownPoll(poll.to_string()))
}

async fn wait_for_comments(ctx: &AppContext, poll_id: &str) -> Result<(), CliError> {
    let page = ctx.config().comments_page_size;
    let id = poll_id.to_string();
    let ready = move |s: &sondaj::state::AppState| {
        let limit = s.comments_limit(&id, page) as usize;
        s.polls
            .get(&id)
            .and_then(|p| p.comments.as_ref().map(|c| (c.len(), p.comments_count.unwrap_or(0))))
            .is_some_and(|(loaded, total)| loaded >= limit.min(usize::try_from(total).unwrap_or(usize::MAX)))
    };
    if ctx.wait_until(ready, LOAD_TIMEOUT).await {
        Ok(())
    } else {
        Err(CliError::Timeout("comments"))
    }
}

async fn print_view(ctx: &AppContext) {
    let state = ctx.snapshot().await;
    println!("{}", ctx.location());
    println!("categorie: {}", state.selected_category.label());
    for modal in state.modals.open_modals() {
        println!("deschis: {}", modal.header);
    }
}

async fn print_notices(ctx: &AppContext) {
    for notice in ctx.snapshot().await.notices {
        eprintln!("[{}] {}", notice.level, notice.text);
    }
}
