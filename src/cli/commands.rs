use std::fmt::Write as _;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use clap::Args;
use unicode_segmentation::UnicodeSegmentation;

use crate::app::{NoteEdit, NotesApp};
use crate::config::AppConfig;
use crate::highlight::{build_highlight_regex, excerpt};
use crate::note::{Note, NoteId};
use crate::render::MarkdownRenderer;
use crate::storage::{NoteStore, StorageHandle};

#[derive(Args, Debug, Clone, Default)]
pub struct NewArgs {
    /// Title for the note (defaults to the configured placeholder)
    #[arg(long)]
    pub title: Option<String>,
    /// Markdown content. If omitted, piped stdin is used.
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only print the first N notes
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Note identifier
    pub id: NoteId,
    /// Print the rendered HTML instead of the markdown source
    #[arg(long)]
    pub html: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Note identifier
    pub id: NoteId,
    /// Replace the title
    #[arg(long)]
    pub title: Option<String>,
    /// Replace the markdown content ("-" reads stdin)
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Note identifier
    pub id: NoteId,
    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Text to look for in titles and content (case-insensitive)
    #[arg()]
    pub query: Vec<String>,
    /// Limit the number of results printed
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn new_note<S: NoteStore>(
    app: &mut NotesApp<S>,
    args: NewArgs,
    piped: Option<String>,
) -> Result<String> {
    let note_id = app.create_note().id;
    if let Some(title) = args.title {
        app.apply_edit(note_id, NoteEdit::Title(title))?;
    }
    if let Some(content) = args.content.or(piped) {
        app.apply_edit(note_id, NoteEdit::Content(content))?;
    }
    app.finish_edit();
    ensure_saved(app)?;
    Ok(format!("Created note #{note_id}\n"))
}

pub fn list_notes<S: NoteStore>(
    app: &NotesApp<S>,
    config: &AppConfig,
    args: ListArgs,
) -> String {
    let notes = app.visible_notes();
    if notes.is_empty() {
        return "No notes found.\n".to_string();
    }
    let limit = args.limit.unwrap_or(notes.len());
    let selected = app.state().selected_note_id();
    let mut out = String::new();
    for note in notes.into_iter().take(limit) {
        let marker = if Some(note.id) == selected { "*" } else { " " };
        let _ = writeln!(&mut out, "{marker}#{}  {}", note.id, note.title);
        let _ = writeln!(&mut out, "    updated {}", note.updated_at_iso());
        if let Some(preview) = build_preview(&note.content, config.notes.preview_chars) {
            let _ = writeln!(&mut out, "    {preview}");
        }
        out.push('\n');
    }
    out
}

pub fn show_note<S: NoteStore>(
    app: &mut NotesApp<S>,
    renderer: &dyn MarkdownRenderer,
    args: ShowArgs,
) -> Result<String> {
    let note = app.select_note(args.id)?;
    let mut out = String::new();
    let _ = writeln!(&mut out, "#{}  {}", note.id, note.title);
    let _ = writeln!(
        &mut out,
        "created {}  updated {}",
        note.created_at_iso(),
        note.updated_at_iso()
    );
    out.push('\n');
    if args.html {
        out.push_str(&renderer.render(&note.content));
    } else {
        out.push_str(&note.content);
        if !note.content.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(out)
}

pub fn edit_note<S: NoteStore>(
    app: &mut NotesApp<S>,
    args: EditArgs,
    piped: Option<String>,
) -> Result<String> {
    let content = if args.content.as_deref() == Some("-") {
        let Some(piped) = piped else {
            bail!("--content - expects the new content on piped stdin");
        };
        Some(piped)
    } else {
        args.content
    };
    if args.title.is_none() && content.is_none() {
        bail!("nothing to change: pass --title and/or --content");
    }

    app.select_note(args.id)?;
    app.begin_edit();
    if let Some(title) = args.title {
        app.apply_edit(args.id, NoteEdit::Title(title))?;
    }
    if let Some(content) = content {
        app.apply_edit(args.id, NoteEdit::Content(content))?;
    }
    app.finish_edit();
    ensure_saved(app)?;

    let title = app
        .selected()
        .map(|note| note.title.clone())
        .unwrap_or_default();
    Ok(format!("Updated note #{} ({title})\n", args.id))
}

pub fn delete_note<S, F>(app: &mut NotesApp<S>, args: DeleteArgs, confirm: F) -> Result<String>
where
    S: NoteStore,
    F: FnOnce(&Note) -> Result<bool>,
{
    let Some(note) = app.state().get(args.id).cloned() else {
        bail!("note #{} not found", args.id);
    };
    if !args.yes && !confirm(&note)? {
        return Ok(format!("Kept note #{}\n", note.id));
    }
    let removed = app.delete_note(note.id)?;
    ensure_saved(app)?;
    Ok(format!("Deleted note #{} ({})\n", removed.id, removed.title))
}

pub fn search_notes<S: NoteStore>(
    app: &NotesApp<S>,
    config: &AppConfig,
    args: SearchArgs,
) -> String {
    let query = args.query.join(" ");
    let limit = args.limit.unwrap_or(config.search.max_results);
    let results = app.search(&query);
    if results.is_empty() {
        return "No matches found.\n".to_string();
    }

    let regex = build_highlight_regex(&query);
    let mut out = String::new();
    for note in results.iter().take(limit) {
        let _ = writeln!(&mut out, "#{}  {}", note.id, note.title);
        let _ = writeln!(&mut out, "    updated {}", note.updated_at_iso());
        let snippet = regex
            .as_ref()
            .and_then(|regex| excerpt(&note.content, regex, config.search.excerpt_radius));
        if let Some(snippet) = snippet {
            let _ = writeln!(&mut out, "    {snippet}");
        }
        out.push('\n');
    }
    if results.len() > limit {
        let _ = writeln!(&mut out, "({} more not shown)", results.len() - limit);
    }
    out
}

pub fn show_status(app: &NotesApp<StorageHandle>) -> String {
    format!(
        "store   {}\nnotes   {}\nstatus  {}\n",
        app.store().database_path().display(),
        app.notes().len(),
        app.sync_status()
    )
}

pub fn confirm_delete(note: &Note) -> Result<bool> {
    let answer = prompt(&format!("Delete note #{} ({})? [y/N]", note.id, note.title))?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

pub fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading note content from stdin")?;
    Ok(Some(buf).filter(|buf| !buf.is_empty()))
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{label} ")?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn ensure_saved<S: NoteStore>(app: &NotesApp<S>) -> Result<()> {
    let status = app.sync_status();
    if status.is_degraded() {
        bail!("changes were not saved ({status})");
    }
    Ok(())
}

fn build_preview(content: &str, max_chars: usize) -> Option<String> {
    if max_chars == 0 {
        return None;
    }
    let joined = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        return None;
    }
    let graphemes = joined.graphemes(true).collect::<Vec<_>>();
    if graphemes.len() <= max_chars {
        Some(joined)
    } else {
        Some(format!("{}…", graphemes[..max_chars].concat()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageOptions;
    use crate::render::CommonMarkRenderer;
    use std::fs;
    use tempfile::TempDir;

    type TestResult<T = ()> = Result<T>;

    fn setup_app() -> TestResult<(TempDir, AppConfig, NotesApp<StorageHandle>)> {
        let temp = TempDir::new().context("creating temp dir")?;
        let mut config = AppConfig::default();
        config.storage.database_path = temp.path().join("data/notes.db");
        let app = reopen(&config);
        Ok((temp, config, app))
    }

    fn reopen(config: &AppConfig) -> NotesApp<StorageHandle> {
        NotesApp::new(StorageHandle::new(&config.storage), &config.notes)
    }

    fn create(app: &mut NotesApp<StorageHandle>, title: &str, content: &str) -> TestResult<NoteId> {
        new_note(
            app,
            NewArgs {
                title: Some(title.into()),
                content: Some(content.into()),
            },
            None,
        )?;
        Ok(app.notes()[0].id)
    }

    #[test]
    fn cli_new_persists_title_and_content() -> TestResult {
        let (_temp, config, mut app) = setup_app()?;
        let output = new_note(
            &mut app,
            NewArgs {
                title: Some("Groceries".into()),
                content: None,
            },
            Some("- milk\n- eggs".into()),
        )?;
        assert!(output.starts_with("Created note #"));

        let reopened = reopen(&config);
        let note = &reopened.notes()[0];
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "- milk\n- eggs");
        assert!(note.updated_at > note.created_at);
        Ok(())
    }

    #[test]
    fn cli_new_without_arguments_uses_placeholder() -> TestResult {
        let (_temp, config, mut app) = setup_app()?;
        new_note(&mut app, NewArgs::default(), None)?;
        let reopened = reopen(&config);
        let note = &reopened.notes()[0];
        assert_eq!(note.title, config.notes.untitled_title);
        assert_eq!(note.created_at, note.updated_at);
        Ok(())
    }

    #[test]
    fn cli_list_shows_newest_first_with_previews() -> TestResult {
        let (_temp, mut config, mut app) = setup_app()?;
        create(&mut app, "Older", "first line\n\nsecond line")?;
        create(&mut app, "Newer", "")?;
        config.notes.preview_chars = 12;

        let output = list_notes(&reopen(&config), &config, ListArgs::default());
        let newer = output.find("Newer").expect("newer listed");
        let older = output.find("Older").expect("older listed");
        assert!(newer < older);
        assert!(output.contains("    first line s…\n"));

        let limited = list_notes(&reopen(&config), &config, ListArgs { limit: Some(1) });
        assert!(!limited.contains("Older"));
        Ok(())
    }

    #[test]
    fn cli_list_reports_empty_store() -> TestResult {
        let (_temp, config, app) = setup_app()?;
        assert_eq!(
            list_notes(&app, &config, ListArgs::default()),
            "No notes found.\n"
        );
        Ok(())
    }

    #[test]
    fn cli_show_prints_source_or_rendered_html() -> TestResult {
        let (_temp, config, mut app) = setup_app()?;
        let id = create(&mut app, "Groceries", "- milk\n- eggs")?;
        let renderer = CommonMarkRenderer::new(&config.render);

        let source = show_note(&mut app, &renderer, ShowArgs { id, html: false })?;
        assert!(source.contains("Groceries"));
        assert!(source.ends_with("- milk\n- eggs\n"));
        assert!(!app.is_editing());

        let html = show_note(&mut app, &renderer, ShowArgs { id, html: true })?;
        assert!(html.contains("<li>milk</li>"));

        assert!(show_note(&mut app, &renderer, ShowArgs { id: 1, html: false }).is_err());
        Ok(())
    }

    #[test]
    fn cli_edit_updates_fields_and_requires_a_change() -> TestResult {
        let (_temp, config, mut app) = setup_app()?;
        let id = create(&mut app, "Draft", "old body")?;

        let err = edit_note(
            &mut app,
            EditArgs {
                id,
                title: None,
                content: None,
            },
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("nothing to change"));

        let output = edit_note(
            &mut app,
            EditArgs {
                id,
                title: Some("Final".into()),
                content: Some("-".into()),
            },
            Some("new body".into()),
        )?;
        assert_eq!(output, format!("Updated note #{id} (Final)\n"));

        let reopened = reopen(&config);
        let note = &reopened.notes()[0];
        assert_eq!(note.title, "Final");
        assert_eq!(note.content, "new body");
        Ok(())
    }

    #[test]
    fn cli_edit_from_stdin_without_piped_input_keeps_content() -> TestResult {
        let (_temp, config, mut app) = setup_app()?;
        let id = create(&mut app, "Journal", "precious body")?;

        let err = edit_note(
            &mut app,
            EditArgs {
                id,
                title: None,
                content: Some("-".into()),
            },
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("piped stdin"));

        assert_eq!(app.notes()[0].content, "precious body");
        let reopened = reopen(&config);
        assert_eq!(reopened.notes()[0].content, "precious body");
        Ok(())
    }

    #[test]
    fn cli_delete_honours_confirmation() -> TestResult {
        let (_temp, config, mut app) = setup_app()?;
        let id = create(&mut app, "Disposable", "body")?;

        let kept = delete_note(&mut app, DeleteArgs { id, yes: false }, |_| Ok(false))?;
        assert_eq!(kept, format!("Kept note #{id}\n"));
        assert_eq!(reopen(&config).notes().len(), 1);

        let deleted = delete_note(&mut app, DeleteArgs { id, yes: false }, |note| {
            assert_eq!(note.title, "Disposable");
            Ok(true)
        })?;
        assert!(deleted.starts_with("Deleted note"));
        assert!(reopen(&config).notes().is_empty());

        assert!(delete_note(&mut app, DeleteArgs { id, yes: true }, |_| Ok(true)).is_err());
        Ok(())
    }

    #[test]
    fn cli_search_brackets_matches_in_content() -> TestResult {
        let (_temp, config, mut app) = setup_app()?;
        create(&mut app, "Groceries", "buy MILK and eggs")?;
        create(&mut app, "Reading", "Dune")?;

        let output = search_notes(
            &app,
            &config,
            SearchArgs {
                query: vec!["milk".into()],
                limit: None,
            },
        );
        assert!(output.contains("Groceries"));
        assert!(output.contains("buy [MILK] and eggs"));
        assert!(!output.contains("Reading"));

        let none = search_notes(
            &app,
            &config,
            SearchArgs {
                query: vec!["bread".into()],
                limit: None,
            },
        );
        assert_eq!(none, "No matches found.\n");

        let all = search_notes(&app, &config, SearchArgs::default());
        assert!(all.contains("Groceries") && all.contains("Reading"));
        Ok(())
    }

    #[test]
    fn cli_mutation_fails_when_store_is_unusable() -> TestResult {
        let temp = TempDir::new()?;
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"file in the way")?;
        let mut storage = StorageOptions::default();
        storage.database_path = blocker.join("notes.db");
        let mut app = NotesApp::new(StorageHandle::new(&storage), &Default::default());

        let err = new_note(&mut app, NewArgs::default(), None).unwrap_err();
        assert!(err.to_string().contains("changes were not saved"));
        assert!(show_status(&app).contains("offline"));
        Ok(())
    }
}
