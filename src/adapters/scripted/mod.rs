//! Scripted UI driver for testing.
//!
//! Simulates the photo collection and the per-photo detail panel in memory,
//! addressed through the same CSS selectors as the real UI. Faults (slow
//! rendering, missing or disabled buttons, failing clicks, lookups and reloads,
//! unreadable labels, sign-in redirects, filtered refreshes) can be scripted
//! per photo or per driver.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Datelike;

use crate::domain::errors::{DriverError, DriverResult};
use crate::domain::models::{
    CalendarDate, ContextHandle, ElementHandle, ExtractedFact, HourConvention, LocaleConfig,
    LocalizedTimeOfDay, Locator, UiSelectors,
};
use crate::domain::ports::UiDriver;

const BASE_URL: &str = "https://photos.example.test";
const WEEKDAYS: [&str; 7] = [
    "月曜日", "火曜日", "水曜日", "木曜日", "金曜日", "土曜日", "日曜日",
];

/// One photo of the simulated collection.
#[derive(Debug, Clone)]
pub struct ScriptedPhoto {
    filename: Option<String>,
    stored: Option<ExtractedFact>,
    malformed_date: bool,
    save_button: SaveButton,
    render_delay: Duration,
}

/// How the date form's save button renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveButton {
    Enabled,
    Disabled,
    Hidden,
    Missing,
}

impl ScriptedPhoto {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            stored: None,
            malformed_date: false,
            save_button: SaveButton::Enabled,
            render_delay: Duration::ZERO,
        }
    }

    /// Photo that already carries a shooting timestamp.
    pub fn with_stored(mut self, fact: ExtractedFact) -> Self {
        self.stored = Some(fact);
        self
    }

    /// The date label renders text that is not a date.
    pub fn with_malformed_date(mut self) -> Self {
        self.malformed_date = true;
        self
    }

    /// The detail panel shows no filename.
    pub fn without_filename(mut self) -> Self {
        self.filename = None;
        self
    }

    /// The date form never shows its save button.
    pub fn without_save_button(mut self) -> Self {
        self.save_button = SaveButton::Missing;
        self
    }

    /// The save button is shown but never enabled.
    pub fn with_disabled_save_button(mut self) -> Self {
        self.save_button = SaveButton::Disabled;
        self
    }

    /// The save button is in the page but not displayed.
    pub fn with_hidden_save_button(mut self) -> Self {
        self.save_button = SaveButton::Hidden;
        self
    }

    /// The detail page renders nothing until `delay` after it was opened.
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Year,
    Month,
    Day,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Link(usize),
    Info,
    Filename,
    EditButton,
    DateLabel,
    TimeLabel,
    AddButton,
    Input(Field),
    Save,
}

#[derive(Debug, Default)]
struct Form {
    year: String,
    month: String,
    day: String,
    time_pending: String,
    time_committed: String,
}

impl Form {
    fn value(&self, field: Field) -> &str {
        match field {
            Field::Year => &self.year,
            Field::Month => &self.month,
            Field::Day => &self.day,
            Field::Time => &self.time_pending,
        }
    }

    fn date(&self) -> Option<CalendarDate> {
        CalendarDate::from_ymd(
            self.year.parse().ok()?,
            self.month.parse().ok()?,
            self.day.parse().ok()?,
        )
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Year => &mut self.year,
            Field::Month => &mut self.month,
            Field::Day => &mut self.day,
            Field::Time => &mut self.time_pending,
        }
    }
}

#[derive(Debug)]
enum Page {
    Blank,
    SignIn,
    Collection,
    Detail {
        photo: usize,
        opened_at: Instant,
        panel_open: bool,
        form: Option<Form>,
    },
}

#[derive(Debug)]
struct Context {
    page: Page,
    url: String,
}

#[derive(Debug)]
struct PhotoState {
    script: ScriptedPhoto,
    /// Time text exactly as last saved through the form.
    time_text: Option<String>,
}

#[derive(Debug)]
struct State {
    photos: Vec<PhotoState>,
    contexts: HashMap<String, Context>,
    active: Option<String>,
    elements: HashMap<String, (String, Part)>,
    next_id: u64,
    dated_hidden: bool,
    quit: bool,
}

/// In-memory [`UiDriver`] over a scripted photo collection.
#[derive(Debug)]
pub struct ScriptedDriver {
    state: Mutex<State>,
    selectors: UiSelectors,
    locale: LocaleConfig,
    auth_redirect: bool,
    hide_dated_on_refresh: bool,
    failing_clicks: AtomicUsize,
    failing_lookups: AtomicUsize,
    failing_refreshes: AtomicUsize,
    saves: AtomicUsize,
    field_writes: AtomicUsize,
    enumerations: AtomicUsize,
    refreshes: AtomicUsize,
    quits: AtomicUsize,
}

impl ScriptedDriver {
    pub fn new(photos: Vec<ScriptedPhoto>) -> Self {
        let main = "ctx-0".to_string();
        let mut contexts = HashMap::new();
        contexts.insert(
            main.clone(),
            Context {
                page: Page::Blank,
                url: "about:blank".to_string(),
            },
        );

        Self {
            state: Mutex::new(State {
                photos: photos
                    .into_iter()
                    .map(|script| PhotoState {
                        script,
                        time_text: None,
                    })
                    .collect(),
                contexts,
                active: Some(main),
                elements: HashMap::new(),
                next_id: 1,
                dated_hidden: false,
                quit: false,
            }),
            selectors: UiSelectors::default(),
            locale: LocaleConfig::default(),
            auth_redirect: false,
            hide_dated_on_refresh: false,
            failing_clicks: AtomicUsize::new(0),
            failing_lookups: AtomicUsize::new(0),
            failing_refreshes: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            field_writes: AtomicUsize::new(0),
            enumerations: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
            quits: AtomicUsize::new(0),
        }
    }

    pub fn with_selectors(mut self, selectors: UiSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_locale(mut self, locale: LocaleConfig) -> Self {
        self.locale = locale;
        self
    }

    /// Every navigation lands on a sign-in page.
    pub fn with_auth_redirect(mut self) -> Self {
        self.auth_redirect = true;
        self
    }

    /// Refreshing the collection hides photos that already carry a timestamp.
    pub fn hide_dated_on_refresh(mut self) -> Self {
        self.hide_dated_on_refresh = true;
        self
    }

    /// The next `n` clicks fail with a non-fatal error.
    pub fn fail_next_clicks(&self, n: usize) {
        self.failing_clicks.store(n, Ordering::SeqCst);
    }

    /// The next `n` element lookups fail with a stale reference.
    pub fn fail_next_lookups(&self, n: usize) {
        self.failing_lookups.store(n, Ordering::SeqCst);
    }

    /// The next `n` page reloads time out.
    pub fn fail_next_refreshes(&self, n: usize) {
        self.failing_refreshes.store(n, Ordering::SeqCst);
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn collection_url(&self) -> String {
        format!("{BASE_URL}/photos/all")
    }

    pub fn item_url(&self, index: usize) -> String {
        format!("{BASE_URL}/photos/all/gallery/{index}")
    }

    /// Timestamp currently stored for photo `index`.
    pub fn stored(&self, index: usize) -> Option<ExtractedFact> {
        self.lock().photos.get(index)?.script.stored
    }

    /// Time text as last saved for photo `index`.
    pub fn time_text(&self, index: usize) -> Option<String> {
        self.lock().photos.get(index)?.time_text.clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of clear/type operations on date inputs.
    pub fn field_write_count(&self) -> usize {
        self.field_writes.load(Ordering::SeqCst)
    }

    /// Number of times the collection links were listed.
    pub fn enumeration_count(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    pub fn quit_count(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the state of a live session.
    fn session(&self) -> DriverResult<MutexGuard<'_, State>> {
        let state = self.lock();
        if state.quit {
            return Err(DriverError::Unreachable("session has been closed".into()));
        }
        Ok(state)
    }

    fn part_for(&self, locator: &Locator) -> Option<PartKind> {
        let selector = locator.selector();
        let ui = &self.selectors;
        let kind = if selector == ui.photo_links {
            PartKind::Links
        } else if selector == ui.info_button {
            PartKind::One(Part::Info)
        } else if selector == ui.filename_label {
            PartKind::One(Part::Filename)
        } else if selector == ui.date_edit_button {
            PartKind::One(Part::EditButton)
        } else if selector == ui.date_label {
            PartKind::One(Part::DateLabel)
        } else if selector == ui.time_label {
            PartKind::One(Part::TimeLabel)
        } else if selector == ui.add_button {
            PartKind::One(Part::AddButton)
        } else if selector == ui.year_input {
            PartKind::One(Part::Input(Field::Year))
        } else if selector == ui.month_input {
            PartKind::One(Part::Input(Field::Month))
        } else if selector == ui.day_input {
            PartKind::One(Part::Input(Field::Day))
        } else if selector == ui.time_input {
            PartKind::One(Part::Input(Field::Time))
        } else if selector == ui.save_button {
            PartKind::One(Part::Save)
        } else {
            return None;
        };
        Some(kind)
    }

    fn text_of(&self, state: &State, part: Part) -> String {
        match part {
            Part::Link(_) | Part::Input(_) => String::new(),
            Part::Info => "info".to_string(),
            Part::Save => "保存".to_string(),
            Part::EditButton => self.locale.edit_label.clone(),
            Part::AddButton => self.locale.add_label.clone(),
            Part::Filename => detail_photo(state)
                .and_then(|p| p.script.filename.clone())
                .unwrap_or_default(),
            Part::DateLabel => match detail_photo(state) {
                Some(photo) if photo.script.malformed_date => "日付不明".to_string(),
                Some(PhotoState {
                    script:
                        ScriptedPhoto {
                            stored: Some(fact),
                            ..
                        },
                    ..
                }) => format!(
                    "{}年{}月{}日",
                    fact.date.year(),
                    fact.date.month(),
                    fact.date.day()
                ),
                _ => String::new(),
            },
            Part::TimeLabel => match detail_photo(state) {
                Some(photo) => match photo.script.stored {
                    Some(fact) => {
                        let weekday = WEEKDAYS
                            [fact.date.as_naive().weekday().num_days_from_monday() as usize];
                        let time = photo.time_text.clone().unwrap_or_else(|| {
                            fact.time.render(&self.locale.time, HourConvention::ZeroBased)
                        });
                        format!("{weekday}{}{time}", self.locale.prefix_separator)
                    }
                    None => String::new(),
                },
                None => String::new(),
            },
        }
    }

    fn register(state: &mut State, context: &str, part: Part) -> ElementHandle {
        let id = format!("el-{}", state.next_id);
        state.next_id += 1;
        state.elements.insert(id.clone(), (context.to_string(), part));
        ElementHandle::new(id)
    }

    /// Resolve an element handle against the active context.
    fn resolve(state: &State, element: &ElementHandle) -> DriverResult<Part> {
        let (context, part) = state
            .elements
            .get(element.id())
            .ok_or_else(|| DriverError::Stale(element.id().to_string()))?;
        if state.active.as_deref() != Some(context.as_str()) || !rendered(state, *part) {
            return Err(DriverError::Stale(element.id().to_string()));
        }
        Ok(*part)
    }

    fn save_form(&self, state: &mut State) {
        let Some(active) = state.active.clone() else {
            return;
        };
        let Some(Context {
            page: Page::Detail { photo, form, .. },
            ..
        }) = state.contexts.get_mut(&active)
        else {
            return;
        };
        let Some(filled) = form.as_ref() else {
            return;
        };

        let date = filled.date();
        let time = LocalizedTimeOfDay::parse(&filled.time_committed, &self.locale.time);
        let (Some(date), Some(time)) = (date, time) else {
            return;
        };

        let time_text = filled.time_committed.clone();
        let photo = *photo;
        *form = None;
        if let Some(target) = state.photos.get_mut(photo) {
            target.script.stored = Some(ExtractedFact::new(date, time));
            target.script.malformed_date = false;
            target.time_text = Some(time_text);
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy)]
enum PartKind {
    Links,
    One(Part),
}

fn active_context(state: &State) -> DriverResult<&Context> {
    state
        .active
        .as_ref()
        .and_then(|id| state.contexts.get(id))
        .ok_or_else(|| DriverError::Protocol("no such window".into()))
}

fn active_context_mut(state: &mut State) -> DriverResult<&mut Context> {
    let id = state
        .active
        .clone()
        .ok_or_else(|| DriverError::Protocol("no such window".into()))?;
    state
        .contexts
        .get_mut(&id)
        .ok_or_else(|| DriverError::Protocol("no such window".into()))
}

fn detail_photo(state: &State) -> Option<&PhotoState> {
    match &active_context(state).ok()?.page {
        Page::Detail { photo, .. } => state.photos.get(*photo),
        _ => None,
    }
}

fn save_button(state: &State) -> Option<SaveButton> {
    detail_photo(state).map(|p| p.script.save_button)
}

/// Consume one scripted failure, if any are left.
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn visible_links(state: &State) -> Vec<usize> {
    state
        .photos
        .iter()
        .enumerate()
        .filter(|(_, p)| !(state.dated_hidden && p.script.stored.is_some()))
        .map(|(i, _)| i)
        .collect()
}

/// Whether `part` is currently on screen in the active context.
fn rendered(state: &State, part: Part) -> bool {
    let Ok(context) = active_context(state) else {
        return false;
    };
    match (&context.page, part) {
        (Page::Collection, Part::Link(i)) => visible_links(state).contains(&i),
        (
            Page::Detail {
                photo,
                opened_at,
                panel_open,
                form,
            },
            part,
        ) => {
            let Some(photo) = state.photos.get(*photo) else {
                return false;
            };
            if opened_at.elapsed() < photo.script.render_delay {
                return false;
            }
            let dated = photo.script.stored.is_some();
            match part {
                Part::Info => true,
                Part::Filename => *panel_open && photo.script.filename.is_some(),
                Part::EditButton | Part::DateLabel | Part::TimeLabel => *panel_open && dated,
                Part::AddButton => *panel_open && !dated && form.is_none(),
                Part::Input(_) => form.is_some(),
                Part::Save => form.is_some() && photo.script.save_button != SaveButton::Missing,
                Part::Link(_) => false,
            }
        }
        _ => false,
    }
}

fn page_for(url: &str) -> Page {
    url.rsplit_once("/gallery/")
        .and_then(|(_, index)| index.parse().ok())
        .map_or(Page::Collection, |photo| Page::Detail {
            photo,
            opened_at: Instant::now(),
            panel_open: false,
            form: None,
        })
}

#[async_trait]
impl UiDriver for ScriptedDriver {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        let mut state = self.session()?;
        let context = active_context_mut(&mut state)?;
        if self.auth_redirect {
            context.page = Page::SignIn;
            context.url = format!("{BASE_URL}/ap/signin?return_to={url}");
        } else {
            context.page = page_for(url);
            context.url = url.to_string();
        }
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        let state = self.session()?;
        Ok(active_context(&state)?.url.clone())
    }

    async fn refresh(&self) -> DriverResult<()> {
        let mut state = self.session()?;
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.failing_refreshes) {
            return Err(DriverError::Timeout("page load".into()));
        }
        let hide = self.hide_dated_on_refresh;
        let context = active_context_mut(&mut state)?;
        let is_collection = matches!(context.page, Page::Collection);
        if !is_collection {
            context.page = page_for(&context.url);
        }
        if is_collection && hide {
            state.dated_hidden = true;
        }
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> DriverResult<Option<ElementHandle>> {
        Ok(self.find_all(locator).await?.into_iter().next())
    }

    async fn find_all(&self, locator: &Locator) -> DriverResult<Vec<ElementHandle>> {
        let mut state = self.session()?;
        if take_one(&self.failing_lookups) {
            return Err(DriverError::Stale(locator.to_string()));
        }
        let context = state
            .active
            .clone()
            .ok_or_else(|| DriverError::Protocol("no such window".into()))?;

        let parts = match self.part_for(locator) {
            Some(PartKind::Links) => {
                if !matches!(active_context(&state)?.page, Page::Collection) {
                    return Ok(Vec::new());
                }
                self.enumerations.fetch_add(1, Ordering::SeqCst);
                visible_links(&state).into_iter().map(Part::Link).collect()
            }
            Some(PartKind::One(part)) if rendered(&state, part) => vec![part],
            _ => Vec::new(),
        };

        Ok(parts
            .into_iter()
            .map(|part| Self::register(&mut state, &context, part))
            .collect())
    }

    async fn text(&self, element: &ElementHandle) -> DriverResult<String> {
        let state = self.session()?;
        let part = Self::resolve(&state, element)?;
        Ok(self.text_of(&state, part))
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        let state = self.session()?;
        let part = Self::resolve(&state, element)?;
        let value = match (part, name) {
            (Part::Link(i), "href") => Some(self.item_url(i)),
            (Part::Input(field), "value") => match &active_context(&state)?.page {
                Page::Detail {
                    form: Some(form), ..
                } => Some(form.value(field).to_string()),
                _ => None,
            },
            _ => None,
        };
        Ok(value)
    }

    async fn is_displayed(&self, element: &ElementHandle) -> DriverResult<bool> {
        let state = self.session()?;
        let part = Self::resolve(&state, element)?;
        Ok(part != Part::Save || save_button(&state) != Some(SaveButton::Hidden))
    }

    async fn is_enabled(&self, element: &ElementHandle) -> DriverResult<bool> {
        let state = self.session()?;
        let part = Self::resolve(&state, element)?;
        Ok(part != Part::Save || save_button(&state) == Some(SaveButton::Enabled))
    }

    async fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        let mut state = self.session()?;
        let part = Self::resolve(&state, element)?;

        if take_one(&self.failing_clicks) {
            return Err(DriverError::NotInteractable(element.id().to_string()));
        }

        if part == Part::Save {
            self.save_form(&mut state);
            return Ok(());
        }

        let stored = detail_photo(&state).and_then(|p| p.script.stored);
        let context = active_context_mut(&mut state)?;
        if let Page::Detail {
            panel_open, form, ..
        } = &mut context.page
        {
            match part {
                Part::Info => *panel_open = true,
                Part::AddButton => *form = Some(Form::default()),
                Part::EditButton => {
                    *form = Some(stored.map_or_else(Form::default, |fact| {
                        let time = fact.time.render(&self.locale.time, HourConvention::ZeroBased);
                        Form {
                            year: fact.date.year_field(),
                            month: fact.date.month_field(),
                            day: fact.date.day_field(),
                            time_pending: time.clone(),
                            time_committed: time,
                        }
                    }));
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> DriverResult<()> {
        self.edit_field(element, |value| value.clear())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> DriverResult<()> {
        self.edit_field(element, |value| value.push_str(text))
    }

    async fn blur(&self, element: &ElementHandle) -> DriverResult<()> {
        let mut state = self.session()?;
        let part = Self::resolve(&state, element)?;
        if let (
            Part::Input(Field::Time),
            Page::Detail {
                form: Some(form), ..
            },
        ) = (part, &mut active_context_mut(&mut state)?.page)
        {
            form.time_committed = form.time_pending.clone();
        }
        Ok(())
    }

    async fn current_context(&self) -> DriverResult<ContextHandle> {
        let state = self.session()?;
        state
            .active
            .clone()
            .map(ContextHandle::new)
            .ok_or_else(|| DriverError::Protocol("no such window".into()))
    }

    async fn open_context(&self, url: &str) -> DriverResult<ContextHandle> {
        let mut state = self.session()?;
        let id = format!("ctx-{}", state.next_id);
        state.next_id += 1;
        state.contexts.insert(
            id.clone(),
            Context {
                page: page_for(url),
                url: url.to_string(),
            },
        );
        state.active = Some(id.clone());
        Ok(ContextHandle::new(id))
    }

    async fn switch_context(&self, context: &ContextHandle) -> DriverResult<()> {
        let mut state = self.session()?;
        if !state.contexts.contains_key(context.id()) {
            return Err(DriverError::Protocol(format!("no such window: {context}")));
        }
        state.active = Some(context.id().to_string());
        Ok(())
    }

    async fn close_context(&self) -> DriverResult<()> {
        let mut state = self.session()?;
        let id = state
            .active
            .take()
            .ok_or_else(|| DriverError::Protocol("no such window".into()))?;
        state.contexts.remove(&id);
        state.elements.retain(|_, (context, _)| *context != id);
        Ok(())
    }

    async fn quit(&self) -> DriverResult<()> {
        self.quits.fetch_add(1, Ordering::SeqCst);
        let mut state = self.session()?;
        state.quit = true;
        state.contexts.clear();
        state.active = None;
        Ok(())
    }
}

impl ScriptedDriver {
    fn edit_field(&self, element: &ElementHandle, edit: impl FnOnce(&mut String)) -> DriverResult<()> {
        let mut state = self.session()?;
        let Part::Input(field) = Self::resolve(&state, element)? else {
            return Err(DriverError::NotInteractable(element.id().to_string()));
        };
        if let Page::Detail {
            form: Some(form), ..
        } = &mut active_context_mut(&mut state)?.page
        {
            edit(form.value_mut(field));
            self.field_writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> ScriptedDriver {
        ScriptedDriver::new(vec![
            ScriptedPhoto::new("VRChat_2024-03-25_14-05-00.png"),
            ScriptedPhoto::new("VRChat_2024-03-26_09-00-00.png"),
        ])
    }

    fn css(selector: &str) -> Locator {
        Locator::css(selector)
    }

    #[tokio::test]
    async fn test_collection_links_have_item_urls() {
        let driver = driver();
        driver.navigate(&driver.collection_url()).await.unwrap();

        let links = driver.find_all(&css(".mosaic-item a")).await.unwrap();
        assert_eq!(links.len(), 2);
        let href = driver.attribute(&links[1], "href").await.unwrap();
        assert_eq!(href, Some(driver.item_url(1)));
        assert_eq!(driver.enumeration_count(), 1);
    }

    #[tokio::test]
    async fn test_panel_needs_info_click() {
        let driver = driver();
        driver.open_context(&driver.item_url(0)).await.unwrap();
        let filename = css(".detail-item.file-info .label");

        assert!(driver.find(&filename).await.unwrap().is_none());
        let info = driver.find(&css("button.info")).await.unwrap().unwrap();
        driver.click(&info).await.unwrap();

        let label = driver.find(&filename).await.unwrap().unwrap();
        assert_eq!(
            driver.text(&label).await.unwrap(),
            "VRChat_2024-03-25_14-05-00.png"
        );
    }

    #[tokio::test]
    async fn test_time_commits_only_on_blur() {
        let ui = UiSelectors::default();
        let driver = driver();
        driver.open_context(&driver.item_url(0)).await.unwrap();
        let info = driver.find(&css(&ui.info_button)).await.unwrap().unwrap();
        driver.click(&info).await.unwrap();
        let add = driver.find(&css(&ui.add_button)).await.unwrap().unwrap();
        driver.click(&add).await.unwrap();

        for (selector, value) in [
            (&ui.year_input, "2024"),
            (&ui.month_input, "03"),
            (&ui.day_input, "25"),
            (&ui.time_input, "午後2時5分"),
        ] {
            let input = driver.find(&css(selector)).await.unwrap().unwrap();
            driver.send_keys(&input, value).await.unwrap();
        }
        let save = driver.find(&css(&ui.save_button)).await.unwrap().unwrap();
        driver.click(&save).await.unwrap();
        assert_eq!(driver.save_count(), 0);

        let time = driver.find(&css(&ui.time_input)).await.unwrap().unwrap();
        driver.blur(&time).await.unwrap();
        driver.click(&save).await.unwrap();
        assert_eq!(driver.save_count(), 1);
        assert_eq!(driver.time_text(0).as_deref(), Some("午後2時5分"));
        assert_eq!(driver.stored(0).unwrap().time.hour_24(), 14);
    }

    #[tokio::test]
    async fn test_elements_go_stale_with_their_context() {
        let driver = driver();
        let home = driver.current_context().await.unwrap();
        driver.open_context(&driver.item_url(0)).await.unwrap();
        let info = driver.find(&css("button.info")).await.unwrap().unwrap();
        driver.close_context().await.unwrap();
        driver.switch_context(&home).await.unwrap();

        assert!(matches!(
            driver.click(&info).await,
            Err(DriverError::Stale(_))
        ));
    }

    #[tokio::test]
    async fn test_render_delay_hides_detail() {
        let driver = ScriptedDriver::new(vec![ScriptedPhoto::new("a.png")
            .with_render_delay(Duration::from_secs(60))]);
        driver.open_context(&driver.item_url(0)).await.unwrap();
        assert!(driver.find(&css("button.info")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_calls_after_quit_are_unreachable() {
        let driver = driver();
        driver.quit().await.unwrap();
        assert!(driver.current_url().await.unwrap_err().is_fatal());
        assert_eq!(driver.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_auth_redirect() {
        let driver = driver().with_auth_redirect();
        driver.navigate(&driver.collection_url()).await.unwrap();
        assert!(driver.current_url().await.unwrap().contains("ap/signin"));
    }
}
