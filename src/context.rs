//! Application context: owns the backends, the state store and the live
//! queries, and exposes every user operation.
//!
//! DESIGN
//! ======
//! Operations follow one shape: check input locally, call a service, then
//! dispatch the resulting actions. Failures are logged, queued as an error
//! notice, and returned to the caller.
//!
//! Three live queries exist at most: the poll list, the votes of the current
//! poll (only while signed in), and the comments of the current poll keyed
//! by `(poll, order, limit)`. Each `sync_*` recomputes its key from state
//! and lets `LiveQuery::ensure` decide whether to resubscribe.
//!
//! The page URL is held behind a std mutex and never across an await.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::backend::identity::IdentityProvider;
use crate::backend::storage::{BlobStorage, ProgressFn};
use crate::backend::{DocumentStore, Query, paths};
use crate::config::AppConfig;
use crate::consent::{KeyValueStore, record_agreement, terms_agreed};
use crate::error::{AppError, ErrorCode};
use crate::notify::Notice;
use crate::services::comments::{add_comment, comments_from_snapshot, comments_query, react};
use crate::services::polls::polls_from_snapshot;
use crate::services::session::record_profile;
use crate::services::votes::{save_vote, votes_from_snapshot};
use crate::services;
use crate::share::{ShareLink, ShareTarget, share_link};
use crate::state::auth::is_admin;
use crate::state::modal::{ADD_POLL_ID, LOGIN_ID, TERMS_ID, edit_modal_id, poll_modal_id};
use crate::state::{Action, AppState, ModalDescriptor, Store};
use crate::subscriptions::LiveQuery;
use crate::types::{Category, CommentOrder, ImageInput, Poll, PollDraft, User};
use crate::validate::{ValidationError, validate_comment, validate_poll_draft, validate_poll_id};
use crate::view_state::{
    ModalAction, PARAM_ACTION, PARAM_CATEGORY, PARAM_COMMENTS_LIMIT, PARAM_POLL, ViewState,
    action_slug, poll_slug, remove_params, set_param,
};
use crate::views::{CommentsView, VoteSummary, comments_view, vote_summary};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("{component} needs an AppProvider with a context")]
    MissingProvider { component: &'static str },
}

impl ErrorCode for ContextError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingProvider { .. } => "E_MISSING_PROVIDER",
        }
    }
}

// =============================================================================
// BACKENDS
// =============================================================================

/// External services the context talks to.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub blobs: Arc<dyn BlobStorage>,
    pub prefs: Arc<dyn KeyValueStore>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CommentsKey {
    poll_id: String,
    order: CommentOrder,
    limit: u32,
}

struct LiveQueries {
    polls: LiveQuery<()>,
    votes: LiveQuery<String>,
    comments: LiveQuery<CommentsKey>,
}

/// Action attempted while signed out, replayed after sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingIntent {
    Vote { poll_id: String, choice: bool },
    React { poll_id: String, comment_id: String, like: bool },
}

// =============================================================================
// CONTEXT
// =============================================================================

pub struct AppContext {
    config: AppConfig,
    backends: Backends,
    state: Store,
    location: Mutex<Url>,
    live: tokio::sync::Mutex<LiveQueries>,
    pending: Mutex<Option<PendingIntent>>,
    session_watch: Mutex<Option<JoinHandle<()>>>,
}

impl AppContext {
    #[must_use]
    pub fn new(config: AppConfig, backends: Backends) -> Arc<Self> {
        let location = config.base_url.clone();
        let state = Store::new(AppState { path: location_path(&location), ..AppState::default() });
        Arc::new(Self {
            config,
            backends,
            state,
            location: Mutex::new(location),
            live: tokio::sync::Mutex::new(LiveQueries {
                polls: LiveQuery::new("polls"),
                votes: LiveQuery::new("votes"),
                comments: LiveQuery::new("comments"),
            }),
            pending: Mutex::new(None),
            session_watch: Mutex::new(None),
        })
    }

    /// Subscribe to the poll list and start following the identity session.
    ///
    /// # Errors
    ///
    /// Returns the store error when the poll subscription cannot be opened.
    pub async fn start(self: &Arc<Self>) -> Result<(), AppError> {
        let state = self.state.clone();
        let opened = {
            let mut live = self.live.lock().await;
            live.polls
                .ensure((), &self.backends.store, Query::collection(paths::POLLS), move |snapshot, generation| {
                    let polls = polls_from_snapshot(&snapshot, &mut rand::rng());
                    let state = state.clone();
                    async move {
                        debug!(count = polls.len(), "poll list updated");
                        state.dispatch_current(&generation, Action::SetPolls(polls)).await;
                    }
                })
                .await
        };
        if let Err(e) = opened {
            return Err(self.fail(e.into()).await);
        }

        let mut sessions = self.backends.identity.observe();
        let initial = sessions.borrow_and_update().clone();
        self.apply_session(initial).await;

        let weak = Arc::downgrade(self);
        let watcher = tokio::spawn(async move {
            while sessions.changed().await.is_ok() {
                let user = sessions.borrow_and_update().clone();
                let Some(ctx) = weak.upgrade() else { break };
                ctx.apply_session(user).await;
            }
            debug!("session watcher stopped");
        });
        if let Some(previous) = self.session_watch.lock().unwrap_or_else(PoisonError::into_inner).replace(watcher) {
            previous.abort();
        }
        info!("context started");
        Ok(())
    }

    /// Stop the session watcher and cancel every live query.
    pub async fn shutdown(&self) {
        if let Some(watcher) = self.session_watch.lock().unwrap_or_else(PoisonError::into_inner).take() {
            watcher.abort();
        }
        let store = self.backends.store.as_ref();
        let mut live = self.live.lock().await;
        live.polls.clear(store);
        live.votes.clear(store);
        live.comments.clear(store);
        info!("context stopped");
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &Store {
        &self.state
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.snapshot().await
    }

    /// Current page URL, view parameters included.
    #[must_use]
    pub fn location(&self) -> Url {
        self.location.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub async fn wait_until(&self, predicate: impl Fn(&AppState) -> bool, timeout: Duration) -> bool {
        self.state.wait_until(predicate, timeout).await
    }

    /// Signed-in user according to the identity provider.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.backends.identity.current_user()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        is_admin(self.current_user().as_ref(), self.config.admin_email.as_deref())
    }

    pub async fn polls_in(&self, category: Category) -> Vec<Poll> {
        self.state.read(|s| s.polls.in_category(category).cloned().collect()).await
    }

    pub async fn vote_summary(&self, poll_id: &str) -> VoteSummary {
        let user = self.current_user();
        self.state.read(|s| vote_summary(s, poll_id, user.as_ref().map(|u| u.uid.as_str()))).await
    }

    pub async fn comments_view(&self, poll_id: &str) -> CommentsView {
        let user = self.current_user();
        let hide_after = self.config.hide_after_dislikes;
        self.state
            .read(|s| comments_view(s, poll_id, user.as_ref().map(|u| u.uid.as_str()), hide_after))
            .await
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    /// Popup sign-in. Records the profile and replays any vote or reaction
    /// attempted while signed out.
    ///
    /// # Errors
    ///
    /// Returns the identity provider's error.
    pub async fn sign_in(&self) -> Result<User, AppError> {
        self.state.dispatch(Action::SetAuthLoading(true)).await;
        let user = match self.backends.identity.sign_in_with_popup().await {
            Ok(user) => user,
            Err(e) => {
                self.state.dispatch(Action::SetAuthLoading(false)).await;
                return Err(self.fail(e.into()).await);
            }
        };
        if let Err(e) = record_profile(self.backends.store.as_ref(), &user).await {
            warn!(uid = %user.uid, error = %e, "profile not recorded");
        }
        self.close_modal_unchecked(LOGIN_ID).await;
        self.apply_session(Some(user.clone())).await;
        self.notify(Notice::success("Autentificare cu succes")).await;
        self.replay_pending().await;
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns the identity provider's error.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        if let Err(e) = self.backends.identity.sign_out().await {
            return Err(self.fail(e.into()).await);
        }
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.apply_session(None).await;
        Ok(())
    }

    async fn apply_session(&self, user: Option<User>) {
        debug!(uid = ?user.as_ref().map(|u| &u.uid), "session changed");
        self.state.dispatch(Action::SetUser(user)).await;
        if let Err(e) = self.sync_votes().await {
            self.fail(e).await;
        }
    }

    fn remember(&self, intent: PendingIntent) {
        debug!(?intent, "sign-in required; intent kept");
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(intent);
    }

    async fn replay_pending(&self) {
        let intent = self.pending.lock().unwrap_or_else(PoisonError::into_inner).take();
        let result = match intent {
            None => return,
            Some(PendingIntent::Vote { poll_id, choice }) => self.cast_vote(&poll_id, choice).await,
            Some(PendingIntent::React { poll_id, comment_id, like }) => self
                .update_comment_like_dislike(&poll_id, &comment_id, like)
                .await
                .map(|_| ()),
        };
        if let Err(e) = result {
            debug!(error = %e, "pending intent not replayed");
        }
    }

    /// Signed-in user, or open the login modal. An intent, when given, is
    /// replayed after sign-in.
    async fn require_user(&self, intent: Option<PendingIntent>) -> Result<User, AppError> {
        if let Some(user) = self.current_user() {
            return Ok(user);
        }
        if let Some(intent) = intent {
            self.remember(intent);
        }
        self.open_modal(ModalDescriptor::login()).await;
        Err(AppError::SignInRequired)
    }

    // -------------------------------------------------------------------------
    // Polls and votes
    // -------------------------------------------------------------------------

    pub async fn select_category(&self, category: Category) {
        self.state.dispatch(Action::SelectCategory(category)).await;
        self.edit_location(|url| set_param(url, PARAM_CATEGORY, category.as_str())).await;
    }

    /// Open the poll's detail modal and make it current.
    ///
    /// # Errors
    ///
    /// `PollNotFound`, or a store error from resubscribing.
    pub async fn open_poll(&self, poll_id: &str) -> Result<(), AppError> {
        let poll = self.poll(poll_id).await?;
        self.edit_location(|url| set_param(url, PARAM_POLL, &poll_slug(&poll.name))).await;
        self.state.dispatch(Action::AddModal(ModalDescriptor::poll_details(&poll))).await;
        self.change_current_poll(poll_id).await
    }

    /// Open the suggestions modal and its comment thread.
    ///
    /// # Errors
    ///
    /// Returns a store error from resubscribing.
    pub async fn open_suggestions(&self) -> Result<(), AppError> {
        self.open_modal(ModalDescriptor::suggestions().with_action_param()).await;
        self.change_current_poll(paths::SUGGESTIONS_POLL_ID).await
    }

    /// Make `poll_id` current and follow its votes and comments.
    ///
    /// # Errors
    ///
    /// Returns the store error when a subscription cannot be opened.
    pub async fn change_current_poll(&self, poll_id: &str) -> Result<(), AppError> {
        self.state.dispatch(Action::ChangeCurrentPoll(poll_id.to_string())).await;
        let synced = match self.sync_votes().await {
            Ok(()) => self.sync_comments().await,
            Err(e) => Err(e),
        };
        match synced {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Record the user's up (`true`) or down vote. Signed out, the vote is
    /// kept and the login modal opens.
    ///
    /// # Errors
    ///
    /// `SignInRequired`, a validation error, or the store error.
    pub async fn cast_vote(&self, poll_id: &str, choice: bool) -> Result<(), AppError> {
        if let Err(e) = validate_poll_id(poll_id) {
            return Err(self.fail(e.into()).await);
        }
        let user = self
            .require_user(Some(PendingIntent::Vote { poll_id: poll_id.to_string(), choice }))
            .await?;

        match save_vote(self.backends.store.as_ref(), poll_id, &user.uid, choice).await {
            Ok(vote) => {
                self.state.dispatch(Action::CastVote { poll_id: poll_id.to_string(), vote }).await;
                self.notify(Notice::success("Votul tau a fost inregistrat cu succes!")).await;
                Ok(())
            }
            Err(e) => Err(self.fail(e.into()).await),
        }
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    /// Show `increment` more comments (a page by default). Returns the new
    /// limit.
    ///
    /// # Errors
    ///
    /// Returns the store error when the comments cannot be resubscribed.
    pub async fn update_comments_limit(&self, poll_id: &str, increment: Option<u32>) -> Result<u32, AppError> {
        let page = self.config.comments_page_size;
        let current = self.state.read(|s| s.comments_limit(poll_id, page)).await;
        let limit = current.saturating_add(increment.unwrap_or(page));
        self.state
            .dispatch(Action::UpdateCommentsLimit { poll_id: poll_id.to_string(), limit })
            .await;
        self.edit_location(|url| set_param(url, PARAM_COMMENTS_LIMIT, &limit.to_string())).await;
        if let Err(e) = self.sync_comments().await {
            return Err(self.fail(e).await);
        }
        Ok(limit)
    }

    /// # Errors
    ///
    /// Returns the store error when the comments cannot be resubscribed.
    pub async fn change_comments_order(&self, order: CommentOrder) -> Result<(), AppError> {
        self.state.dispatch(Action::SetCommentsOrder(order)).await;
        match self.sync_comments().await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e).await),
        }
    }

    pub async fn expand_comment(&self, comment_id: &str) {
        self.state.dispatch(Action::ExpandComment(comment_id.to_string())).await;
    }

    /// Post a comment. Text is validated before anything is sent. Returns
    /// the new comment id.
    ///
    /// # Errors
    ///
    /// A validation error, `SignInRequired`, or the store error.
    pub async fn add_new_comment(&self, poll_id: &str, text: &str) -> Result<String, AppError> {
        let text = match validate_poll_id(poll_id)
            .and_then(|()| validate_comment(text, &self.config.comment_rules))
        {
            Ok(text) => text,
            Err(e) => return Err(self.fail(e.into()).await),
        };
        let user = self.require_user(None).await?;

        let id = match add_comment(self.backends.store.as_ref(), poll_id, text, &user).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail(e).await),
        };
        // Grow the window by one so the new comment does not push another out.
        let page = self.config.comments_page_size;
        let limit = self.state.read(|s| s.comments_limit(poll_id, page)).await + 1;
        self.state
            .dispatch(Action::UpdateCommentsLimit { poll_id: poll_id.to_string(), limit })
            .await;
        if let Err(e) = self.sync_comments().await {
            self.fail(e).await;
        }
        self.notify(Notice::success("Comentariul a fost adaugat cu succes.")).await;
        Ok(id)
    }

    /// Like (`true`) or dislike a comment. Signed out, the reaction is kept
    /// and the login modal opens.
    ///
    /// # Errors
    ///
    /// `SignInRequired`, `CommentNotFound`, or the store error.
    pub async fn update_comment_like_dislike(
        &self,
        poll_id: &str,
        comment_id: &str,
        like: bool,
    ) -> Result<services::comments::ReactionUpdate, AppError> {
        let user = self
            .require_user(Some(PendingIntent::React {
                poll_id: poll_id.to_string(),
                comment_id: comment_id.to_string(),
                like,
            }))
            .await?;
        let update = match react(self.backends.store.as_ref(), poll_id, comment_id, &user.uid, like).await {
            Ok(update) => update,
            Err(e) => return Err(self.fail(e).await),
        };
        self.state
            .dispatch(Action::UpdateCommentVotes {
                poll_id: poll_id.to_string(),
                comment_id: comment_id.to_string(),
                votes: update.votes.clone(),
                upvotes_count: update.upvotes_count,
            })
            .await;
        self.notify(Notice::success("Comentariul a fost votat cu succes.")).await;
        Ok(update)
    }

    // -------------------------------------------------------------------------
    // Modals and URL
    // -------------------------------------------------------------------------

    pub async fn open_modal(&self, descriptor: ModalDescriptor) {
        if descriptor.replace_url {
            let slug = action_slug(&descriptor.header);
            self.edit_location(|url| set_param(url, PARAM_ACTION, &slug)).await;
        }
        self.state.dispatch(Action::AddModal(descriptor)).await;
    }

    /// Close a modal and drop its URL parameters. Returns false for an
    /// unknown id or a modal the user may not dismiss.
    pub async fn close_modal(&self, id: &str) -> bool {
        let dismissable = self.state.read(|s| s.modals.get(id).map(|m| m.dismissable)).await;
        match dismissable {
            Some(true) => self.close_modal_unchecked(id).await,
            Some(false) => {
                debug!(modal = id, "modal is not dismissable");
                false
            }
            None => false,
        }
    }

    async fn close_modal_unchecked(&self, id: &str) -> bool {
        let Some(kind) = self.state.read(|s| s.modals.get(id).map(|m| m.kind.clone())).await else {
            return false;
        };
        self.edit_location(|url| remove_params(url, kind.url_params())).await;
        self.state.dispatch(Action::CloseModal(id.to_string())).await;
        true
    }

    /// Rebuild the view from a page URL. Until the terms are accepted only
    /// the terms modal opens; the rest waits for `agree_terms`.
    ///
    /// # Errors
    ///
    /// Returns a store error from opening the linked poll.
    pub async fn restore_from_url(&self, url: Url) -> Result<(), AppError> {
        let view = ViewState::from_url(&url);
        self.edit_location(|location| *location = url).await;
        if !terms_agreed(self.backends.prefs.as_ref()) {
            self.open_modal(ModalDescriptor::terms()).await;
            return Ok(());
        }
        self.apply_view(view).await
    }

    /// Persist consent, close the terms modal, then restore the view the URL
    /// asked for.
    ///
    /// # Errors
    ///
    /// Returns the preferences error when consent cannot be saved.
    pub async fn agree_terms(&self) -> Result<(), AppError> {
        if let Err(e) = record_agreement(self.backends.prefs.as_ref()) {
            return Err(self.fail(e.into()).await);
        }
        let mut view = ViewState::from_url(&self.location());
        if view.action == Some(ModalAction::Terms) {
            view.action = None;
        }
        self.close_modal_unchecked(TERMS_ID).await;
        self.notify(Notice::success("Termeni si Conditii acceptate")).await;
        self.apply_view(view).await
    }

    async fn apply_view(&self, view: ViewState) -> Result<(), AppError> {
        if let Some(category) = view.category {
            self.select_category(category).await;
        }
        if let Some(slug) = view.poll_slug.as_deref() {
            let found = self.state.read(|s| s.polls.find_by_slug(slug).map(|p| p.id.clone())).await;
            match found {
                Some(poll_id) => {
                    if let Some(limit) = view.comments_limit {
                        self.state
                            .dispatch(Action::UpdateCommentsLimit { poll_id: poll_id.clone(), limit })
                            .await;
                    }
                    self.open_poll(&poll_id).await?;
                }
                None => warn!(%slug, "no poll matches the URL"),
            }
        }
        match view.action {
            Some(ModalAction::Login) => self.open_modal(ModalDescriptor::login().with_action_param()).await,
            Some(ModalAction::Suggestions) => self.open_suggestions().await?,
            Some(ModalAction::Terms) => self.open_modal(ModalDescriptor::terms().with_action_param()).await,
            None => {}
        }
        Ok(())
    }

    async fn edit_location(&self, edit: impl FnOnce(&mut Url)) {
        let path = {
            let mut url = self.location.lock().unwrap_or_else(PoisonError::into_inner);
            edit(&mut url);
            location_path(&url)
        };
        self.state.dispatch(Action::SetPath(path)).await;
    }

    // -------------------------------------------------------------------------
    // Administration
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// `NotAdmin` for anyone but the administrator.
    pub async fn open_add_poll(&self) -> Result<(), AppError> {
        self.require_admin().await?;
        self.open_modal(ModalDescriptor::add_poll()).await;
        Ok(())
    }

    /// Open the edit modal. Returns the form pre-filled from the poll, with
    /// its current image kept unless replaced.
    ///
    /// # Errors
    ///
    /// `NotAdmin` or `PollNotFound`.
    pub async fn open_edit_poll(&self, poll_id: &str) -> Result<(PollDraft, Option<ImageInput>), AppError> {
        self.require_admin().await?;
        let poll = self.poll(poll_id).await?;
        self.open_modal(ModalDescriptor::edit_poll(&poll)).await;
        let image = Some(poll.image.clone()).filter(|url| !url.is_empty()).map(ImageInput::Existing);
        Ok((PollDraft::from_poll(&poll), image))
    }

    /// Create a poll, or edit `existing_id`. Returns the poll id.
    ///
    /// # Errors
    ///
    /// `NotAdmin`, a validation error, or the storage or store error.
    pub async fn save_poll(
        &self,
        existing_id: Option<&str>,
        draft: &PollDraft,
        image: Option<ImageInput>,
        progress: ProgressFn<'_>,
    ) -> Result<String, AppError> {
        self.require_admin().await?;
        if let Err(e) = validate_poll_draft(draft, image.is_some()) {
            return Err(self.fail(e.into()).await);
        }
        let Some(image) = image else {
            return Err(self.fail(ValidationError::MissingImage.into()).await);
        };

        let saved = services::polls::save_poll(
            self.backends.store.as_ref(),
            self.backends.blobs.as_ref(),
            existing_id,
            draft,
            image,
            progress,
        )
        .await;
        let id = match saved {
            Ok(id) => id,
            Err(e) => return Err(self.fail(e).await),
        };
        match existing_id {
            Some(existing) => {
                self.close_modal_unchecked(&edit_modal_id(existing)).await;
                self.notify(Notice::success("Sondaj actualizat cu succes")).await;
            }
            None => {
                self.close_modal_unchecked(ADD_POLL_ID).await;
                self.notify(Notice::success("Sondaj adaugat cu succes")).await;
            }
        }
        Ok(id)
    }

    /// # Errors
    ///
    /// `NotAdmin` or the store error.
    pub async fn delete_poll(&self, poll_id: &str) -> Result<(), AppError> {
        self.require_admin().await?;
        if let Err(e) = services::polls::delete_poll(self.backends.store.as_ref(), poll_id).await {
            return Err(self.fail(e).await);
        }
        self.close_modal_unchecked(&poll_modal_id(poll_id)).await;
        self.notify(Notice::success("Sondaj sters cu succes")).await;
        Ok(())
    }

    async fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(self.fail(AppError::NotAdmin).await)
        }
    }

    // -------------------------------------------------------------------------
    // Sharing and notices
    // -------------------------------------------------------------------------

    /// Hand the poll's link to `target`.
    ///
    /// # Errors
    ///
    /// `PollNotFound`, or the share target's error.
    pub async fn share_poll(&self, poll_id: &str, target: &dyn ShareTarget) -> Result<ShareLink, AppError> {
        let poll = self.poll(poll_id).await?;
        let link = share_link(&poll, &self.location());
        match target.share(&link) {
            Ok(()) => {
                info!(%poll_id, url = %link.url, "poll shared");
                Ok(link)
            }
            Err(e) => Err(self.fail(e.into()).await),
        }
    }

    pub async fn dismiss_notice(&self) {
        self.state.dispatch(Action::DismissNotice).await;
    }

    async fn notify(&self, notice: Notice) {
        notice.log();
        self.state.dispatch(Action::Notify(notice)).await;
    }

    /// Log `err`, queue its error notice and hand it back.
    async fn fail(&self, err: AppError) -> AppError {
        warn!(error = %err, code = err.error_code(), "operation failed");
        self.state.dispatch(Action::HandleError(err.user_message())).await;
        err
    }

    async fn poll(&self, poll_id: &str) -> Result<Poll, AppError> {
        match self.state.read(|s| s.polls.get(poll_id).cloned()).await {
            Some(poll) => Ok(poll),
            None => Err(self.fail(AppError::PollNotFound(poll_id.to_string())).await),
        }
    }

    // -------------------------------------------------------------------------
    // Live queries
    // -------------------------------------------------------------------------

    async fn sync_votes(&self) -> Result<(), AppError> {
        let poll_id = self.state.read(|s| s.current_poll_id.clone()).await;
        let store = &self.backends.store;
        let mut live = self.live.lock().await;
        let (Some(poll_id), true) = (poll_id, self.current_user().is_some()) else {
            live.votes.clear(store.as_ref());
            return Ok(());
        };

        let state = self.state.clone();
        let query = Query::collection(paths::votes(&poll_id));
        live.votes
            .ensure(poll_id.clone(), store, query, move |snapshot, generation| {
                let state = state.clone();
                let poll_id = poll_id.clone();
                async move {
                    let votes = votes_from_snapshot(&snapshot);
                    state.dispatch_current(&generation, Action::UpdateVotes { poll_id, votes }).await;
                }
            })
            .await?;
        Ok(())
    }

    async fn sync_comments(&self) -> Result<(), AppError> {
        let page = self.config.comments_page_size;
        let key = self
            .state
            .read(|s| {
                s.current_poll_id.as_ref().map(|poll_id| CommentsKey {
                    poll_id: poll_id.clone(),
                    order: s.comments_order,
                    limit: s.comments_limit(poll_id, page),
                })
            })
            .await;
        let store = &self.backends.store;
        let mut live = self.live.lock().await;
        let Some(key) = key else {
            live.comments.clear(store.as_ref());
            return Ok(());
        };

        let query = comments_query(&key.poll_id, key.order, key.limit);
        let state = self.state.clone();
        let counter = Arc::clone(store);
        let poll_id = key.poll_id.clone();
        live.comments
            .ensure(key, store, query, move |snapshot, generation| {
                let state = state.clone();
                let counter = Arc::clone(&counter);
                let poll_id = poll_id.clone();
                async move {
                    let comments = comments_from_snapshot(&snapshot);
                    let total = match counter.count(&paths::comments(&poll_id)).await {
                        Ok(total) => total,
                        Err(e) => {
                            warn!(%poll_id, error = %e, "comment count unavailable");
                            comments.len() as u64
                        }
                    };
                    state
                        .dispatch_current(&generation, Action::UpdateComments { poll_id, comments, total })
                        .await;
                }
            })
            .await?;
        Ok(())
    }
}

/// Path and query of a page URL, as kept in `AppState::path`.
fn location_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

// =============================================================================
// PROVIDER
// =============================================================================

/// Holds the context components are given. Components call `require`.
#[derive(Clone, Default)]
pub struct AppProvider {
    context: Option<Arc<AppContext>>,
}

impl AppProvider {
    #[must_use]
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context: Some(context) }
    }

    /// Provider with no context; every `require` fails.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// `MissingProvider` naming `component` when no context was provided.
    pub fn require(&self, component: &'static str) -> Result<Arc<AppContext>, ContextError> {
        self.context.clone().ok_or(ContextError::MissingProvider { component })
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::backend::identity::MemoryIdentity;
    use crate::backend::memory::MemoryStore;
    use crate::backend::storage::MemoryBlobStorage;
    use crate::consent::MemoryKeyValue;
    use serde_json::{Value, json};

    pub const ADMIN_EMAIL: &str = "admin@sondaj.ro";

    pub struct Harness {
        pub ctx: Arc<AppContext>,
        pub store: MemoryStore,
        pub identity: MemoryIdentity,
        pub blobs: MemoryBlobStorage,
        pub prefs: Arc<MemoryKeyValue>,
    }

    #[must_use]
    pub fn test_config() -> AppConfig {
        AppConfig {
            admin_email: Some(ADMIN_EMAIL.into()),
            base_url: Url::parse("https://sondaj.ro/").expect("valid url"),
            ..AppConfig::default()
        }
    }

    #[must_use]
    pub fn user(uid: &str) -> User {
        User {
            uid: uid.into(),
            display_name: Some(format!("User {uid}")),
            email: Some(format!("{uid}@example.ro")),
            ..User::default()
        }
    }

    #[must_use]
    pub fn admin() -> User {
        User { email: Some(ADMIN_EMAIL.into()), ..user("admin") }
    }

    /// Poll document as stored.
    #[must_use]
    pub fn poll_doc(name: &str, category: Category) -> Value {
        json!({
            "nume": name,
            "pozitie": "Candidat",
            "detalii": "<p>Detalii</p>",
            "poza": "memory://images/x.png",
            "tipSondaj": category.as_str(),
            "timestamp": 1,
        })
    }

    /// Context over in-memory backends with consent already given.
    #[must_use]
    pub fn harness(store: MemoryStore) -> Harness {
        harness_with(store, Arc::new(MemoryKeyValue::agreed()))
    }

    #[must_use]
    pub fn harness_with(store: MemoryStore, prefs: Arc<MemoryKeyValue>) -> Harness {
        let identity = MemoryIdentity::new();
        let blobs = MemoryBlobStorage::new();
        let backends = Backends {
            store: Arc::new(store.clone()),
            identity: Arc::new(identity.clone()),
            blobs: Arc::new(blobs.clone()),
            prefs: prefs.clone(),
        };
        Harness { ctx: AppContext::new(test_config(), backends), store, identity, blobs, prefs }
    }

    /// Started harness with the poll list loaded.
    pub async fn started(store: MemoryStore) -> Harness {
        let harness = harness(store);
        harness.ctx.start().await.expect("start");
        assert!(harness.ctx.wait_until(|s| s.polls_loaded, Duration::from_secs(1)).await);
        harness
    }

    /// Sign in through the scripted popup.
    pub async fn sign_in_as(harness: &Harness, user: User) {
        harness.identity.set_popup(crate::backend::identity::PopupOutcome::SignIn(user));
        harness.ctx.sign_in().await.expect("sign in");
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
