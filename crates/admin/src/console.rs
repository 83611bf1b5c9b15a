//! Admin console composition root.
//!
//! Wires the session gate, product list, edit form, delete dialog, toast and
//! loading flags together. Every backend failure is handled here: it is
//! logged, surfaced as a toast or form message, and never escapes except as a
//! return value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use hexmart_api::UploadFile;
use hexmart_core::ui::{ActionKey, ActionTracker, Modal, ToastController};
use hexmart_core::{Credentials, Product, ProductDraft};
use tokio::sync::watch;
use tracing::instrument;

use crate::api::AdminApi;
use crate::auth::{self, AuthError, LOGIN_SUCCESS, LoginMessage};
use crate::confirm::DeleteConfirmation;
use crate::products::editor::{self, ChangeCallback, EditorMode, FormError, ProductEditor};
use crate::products::list::{ListSnapshot, ProductListController};

/// Delay between a successful save and the form closing.
pub const MODAL_CLOSE_DELAY: Duration = Duration::from_millis(500);
/// Delay between "登入成功" and the console appearing.
pub const LOGIN_REDIRECT_DELAY: Duration = Duration::from_secs(1);

pub const CREATE_SUCCESS: &str = "新增成功";
pub const EDIT_SUCCESS: &str = "編輯成功";
pub const ACTION_FAILED: &str = "操作失敗";
pub const DELETE_SUCCESS: &str = "刪除成功";

/// Sentinel for "no token verified yet".
const UNVERIFIED: u64 = u64::MAX;

/// Which top-level view is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Screen {
    /// Session verification in progress.
    #[default]
    Checking,
    Login,
    Products,
}

/// Console state published to the view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsoleView {
    pub screen: Screen,
    pub login_message: Option<LoginMessage>,
    /// Owner's copy of the form draft. Only the editor's change callback
    /// writes it.
    pub draft: Option<ProductDraft>,
    pub editing: Option<EditorMode>,
}

/// The admin console.
pub struct AdminConsole<A> {
    api: Arc<A>,
    list: ProductListController<A>,
    tracker: ActionTracker,
    toasts: ToastController,
    product_modal: Modal,
    delete: DeleteConfirmation,
    editor: Arc<Mutex<Option<ProductEditor>>>,
    view: Arc<watch::Sender<ConsoleView>>,
    /// Session version that last went through `admin/check`.
    verified: Arc<AtomicU64>,
}

impl<A> Clone for AdminConsole<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            list: self.list.clone(),
            tracker: self.tracker.clone(),
            toasts: self.toasts.clone(),
            product_modal: self.product_modal.clone(),
            delete: self.delete.clone(),
            editor: Arc::clone(&self.editor),
            view: Arc::clone(&self.view),
            verified: Arc::clone(&self.verified),
        }
    }
}

impl<A: AdminApi> AdminConsole<A> {
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self::with_toasts(api, ToastController::default())
    }

    #[must_use]
    pub fn with_toasts(api: Arc<A>, toasts: ToastController) -> Self {
        let (view, _rx) = watch::channel(ConsoleView::default());
        Self {
            list: ProductListController::new(Arc::clone(&api)),
            api,
            tracker: ActionTracker::new(),
            toasts,
            product_modal: Modal::new(),
            delete: DeleteConfirmation::new(),
            editor: Arc::new(Mutex::new(None)),
            view: Arc::new(view),
            verified: Arc::new(AtomicU64::new(UNVERIFIED)),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The backend the console talks to.
    #[must_use]
    pub const fn api(&self) -> &Arc<A> {
        &self.api
    }

    #[must_use]
    pub fn view(&self) -> ConsoleView {
        self.view.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConsoleView> {
        self.view.subscribe()
    }

    #[must_use]
    pub fn products(&self) -> ListSnapshot {
        self.list.snapshot()
    }

    #[must_use]
    pub const fn list(&self) -> &ProductListController<A> {
        &self.list
    }

    #[must_use]
    pub const fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }

    #[must_use]
    pub const fn toasts(&self) -> &ToastController {
        &self.toasts
    }

    #[must_use]
    pub const fn product_modal(&self) -> &Modal {
        &self.product_modal
    }

    #[must_use]
    pub const fn delete_dialog(&self) -> &DeleteConfirmation {
        &self.delete
    }

    /// The editor's current draft, if the form is open.
    #[must_use]
    pub fn editor_draft(&self) -> Option<ProductDraft> {
        self.editor_lock().as_ref().map(|e| e.draft().clone())
    }

    // =========================================================================
    // Session gate
    // =========================================================================

    /// Verify the stored token, once per token.
    ///
    /// No cookie goes straight to the login view. A rejected or failed check
    /// shows the login view and is not retried until the token changes.
    #[instrument(skip(self))]
    pub async fn check_admin(&self) {
        let session = self.api.session();
        let version = session.version();
        if self.verified.swap(version, Ordering::SeqCst) == version {
            tracing::debug!(version, "Session already verified");
            return;
        }

        if !session.is_present() {
            self.set_authenticated(false).await;
            return;
        }

        self.set_screen(Screen::Checking);
        let verdict = self
            .tracker
            .run_tracked(&ActionKey::Verify, auth::verify(self.api.as_ref()))
            .await;

        match verdict {
            Ok(()) => self.set_authenticated(true).await,
            Err(AuthError::Unauthorized) => {
                tracing::info!("Session rejected, login required");
                self.set_authenticated(false).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Session check failed");
                self.set_authenticated(false).await;
            }
        }
    }

    /// Switch between the login view and the console; entering the console
    /// fetches the current page.
    pub async fn set_authenticated(&self, authenticated: bool) {
        if authenticated {
            self.set_screen(Screen::Products);
            self.list.refresh().await;
        } else {
            self.set_screen(Screen::Login);
        }
    }

    /// Sign in, store the token, show "登入成功" and enter the console after
    /// [`LOGIN_REDIRECT_DELAY`].
    ///
    /// # Errors
    ///
    /// Returns the `AuthError` also shown as the form's failure message, or
    /// `AuthError::InProgress` without touching the form while another
    /// sign-in is running.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        if self.tracker.is_loading(&ActionKey::Login) {
            return Err(AuthError::InProgress);
        }

        let api = self.api.as_ref();
        let outcome = self
            .tracker
            .run_tracked(&ActionKey::Login, async {
                let grant = auth::login(api, credentials).await?;
                grant.persist(api.session())
            })
            .await;

        match outcome {
            Ok(()) => {
                self.verified
                    .store(self.api.session().version(), Ordering::SeqCst);
                self.view.send_modify(|view| {
                    view.login_message = Some(LoginMessage::Success(LOGIN_SUCCESS.to_string()));
                });
                tokio::time::sleep(LOGIN_REDIRECT_DELAY).await;
                self.set_authenticated(true).await;
                Ok(())
            }
            Err(e) => {
                let text = match &e {
                    AuthError::InvalidCredentials(message) => message.clone(),
                    other => other.to_string(),
                };
                self.view.send_modify(|view| {
                    view.screen = Screen::Login;
                    view.login_message = Some(LoginMessage::Failure(text));
                });
                Err(e)
            }
        }
    }

    /// Clear the cookie, drop to the login view and discard pending list
    /// results.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the cookie jar cannot be removed. The
    /// console is logged out locally either way.
    pub fn logout(&self) -> Result<(), AuthError> {
        let result = auth::logout(self.api.session());
        self.list.reset();
        self.verified
            .store(self.api.session().version(), Ordering::SeqCst);
        self.editor_lock().take();
        self.product_modal.close();
        self.delete.dismiss();
        self.view.send_replace(ConsoleView {
            screen: Screen::Login,
            ..ConsoleView::default()
        });
        result
    }

    // =========================================================================
    // Product list
    // =========================================================================

    /// Show another page. Ignored outside the console view.
    pub async fn change_page(&self, page: u32) -> bool {
        let screen = self.view.borrow().screen;
        if screen != Screen::Products {
            return false;
        }
        self.list.change_page(page).await
    }

    // =========================================================================
    // Product form
    // =========================================================================

    /// Open the form with a blank draft.
    pub fn open_create(&self) {
        self.open_editor(ProductEditor::create());
    }

    /// Open the form with a copy of `product`.
    pub fn open_edit(&self, product: &Product) {
        self.open_editor(ProductEditor::edit(product));
    }

    fn open_editor(&self, editor: ProductEditor) {
        let view = Arc::clone(&self.view);
        let callback: ChangeCallback = Arc::new(move |draft: &ProductDraft| {
            view.send_modify(|v| v.draft = Some(draft.clone()));
        });
        let editor = editor.on_change(callback);

        self.view.send_modify(|view| {
            view.draft = Some(editor.draft().clone());
            view.editing = Some(editor.mode().clone());
        });
        *self.editor_lock() = Some(editor);
        self.product_modal.open();
    }

    /// Apply raw input to a named form field.
    ///
    /// # Errors
    ///
    /// Returns `FormError` for unknown fields, bad input or a closed form.
    pub fn edit_field(&self, name: &str, input: &str) -> Result<(), FormError> {
        self.with_editor(|editor| editor.set_named(name, input))
    }

    /// # Errors
    ///
    /// Returns `FormError` for ratings outside 1..=5 or a closed form.
    pub fn set_rating(&self, stars: i64) -> Result<(), FormError> {
        self.with_editor(|editor| editor.set_rating(stars))
    }

    /// # Errors
    ///
    /// Returns `FormError::Closed` when no form is open.
    pub fn remove_last_image(&self) -> Result<(), FormError> {
        self.with_editor(|editor| {
            editor.remove_last_image();
            Ok(())
        })
    }

    /// Upload an image and append it to the draft's secondary images.
    ///
    /// Returns whether the draft changed.
    pub async fn add_image(&self, file: UploadFile) -> bool {
        let form_open = self.editor_lock().is_some();
        if !form_open {
            return false;
        }
        let Some(url) = editor::upload_image(self.api.as_ref(), file).await else {
            return false;
        };
        self.with_editor(|editor| {
            editor.push_image(url);
            Ok(())
        })
        .is_ok()
    }

    /// Create or update the product in the form.
    ///
    /// On success: success toast, form closes after [`MODAL_CLOSE_DELAY`], and
    /// the list is fetched once. On failure: error toast with the backend's
    /// messages, form left open with its draft.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> bool {
        if self.tracker.is_loading(&ActionKey::ProductAction) {
            return false;
        }
        let current = {
            let guard = self.editor_lock();
            guard.as_ref().map(|e| (e.mode().clone(), e.draft().clone()))
        };
        let Some((mode, draft)) = current else {
            return false;
        };

        let api = self.api.as_ref();
        let result = self
            .tracker
            .run_tracked(&ActionKey::ProductAction, async {
                match &mode {
                    EditorMode::Create => api.create_product(&draft).await,
                    EditorMode::Edit(id) => api.update_product(id, &draft).await,
                }
            })
            .await;

        match result {
            Ok(_) => {
                let message = match mode {
                    EditorMode::Create => CREATE_SUCCESS,
                    EditorMode::Edit(_) => EDIT_SUCCESS,
                };
                self.toasts.success(message);
                drop(self.product_modal.close_after(MODAL_CLOSE_DELAY));
                self.list.refresh().await;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Product save failed");
                self.toasts
                    .error(e.message().unwrap_or_else(|| ACTION_FAILED.to_string()));
                false
            }
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Ask for confirmation before deleting `product`.
    pub fn request_delete(&self, product: &Product) {
        self.delete.request(product);
    }

    pub fn cancel_delete(&self) {
        self.delete.dismiss();
    }

    /// Delete the product the dialog refers to.
    ///
    /// Success toasts "刪除成功", closes the dialog and refetches. Failure is
    /// logged and leaves the dialog as it was.
    #[instrument(skip(self))]
    pub async fn confirm_delete(&self) -> bool {
        let Some(target) = self.delete.target() else {
            return false;
        };
        let key = ActionKey::Delete(target.id.to_string());
        if self.tracker.is_loading(&key) {
            return false;
        }

        let result = self
            .tracker
            .run_tracked(&key, self.api.delete_product(&target.id))
            .await;

        match result {
            Ok(_) => {
                self.toasts.success(DELETE_SUCCESS);
                self.delete.dismiss();
                self.list.refresh().await;
                true
            }
            Err(e) => {
                tracing::error!(product_id = %target.id, error = %e, "Product delete failed");
                false
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn set_screen(&self, screen: Screen) {
        self.view.send_if_modified(|view| {
            if view.screen == screen {
                false
            } else {
                view.screen = screen;
                true
            }
        });
    }

    fn editor_lock(&self) -> MutexGuard<'_, Option<ProductEditor>> {
        self.editor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_editor(
        &self,
        edit: impl FnOnce(&mut ProductEditor) -> Result<(), FormError>,
    ) -> Result<(), FormError> {
        let mut guard = self.editor_lock();
        let editor = guard.as_mut().ok_or(FormError::Closed)?;
        edit(editor)
    }
}
