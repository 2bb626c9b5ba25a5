//! Workflow guides for UserPromptSubmit and PostToolUse.
//!
//! A prompt that mentions debugging, planning, parallel work and so on gets
//! the matching guide from `<project>/.claude/guides/` injected as a
//! `<system-reminder>` block, always preceded by the project's foundation
//! guide. Each guide goes in at most once per session and project: the
//! [`SessionLedger`] under `hooks/state/workflow/` records what was sent.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::Result;
use crate::io::atomic_write;
use crate::paths::guide_path;

/// Tool whose completion triggers the parallel guide on PostToolUse.
pub const PLAN_EXIT_TOOL: &str = "ExitPlanMode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Guide {
    Foundation,
    Brainstorming,
    DeepResearch,
    Planning,
    Implementation,
    Debug,
    Investigation,
    Parallel,
}

impl Guide {
    pub const ALL: [Guide; 8] = [
        Guide::Foundation,
        Guide::Brainstorming,
        Guide::DeepResearch,
        Guide::Planning,
        Guide::Implementation,
        Guide::Debug,
        Guide::Investigation,
        Guide::Parallel,
    ];

    /// Guides selected by prompt keywords, in injection order.
    pub const KEYWORD: [Guide; 7] = [
        Guide::Brainstorming,
        Guide::DeepResearch,
        Guide::Planning,
        Guide::Implementation,
        Guide::Debug,
        Guide::Investigation,
        Guide::Parallel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Guide::Foundation => "FOUNDATION",
            Guide::Brainstorming => "BRAINSTORMING",
            Guide::DeepResearch => "DEEP_RESEARCH",
            Guide::Planning => "PLANNING",
            Guide::Implementation => "IMPLEMENTATION",
            Guide::Debug => "DEBUG",
            Guide::Investigation => "INVESTIGATION",
            Guide::Parallel => "PARALLEL",
        }
    }

    /// File stem under `.claude/guides/`.
    pub fn file_stem(self) -> &'static str {
        match self {
            Guide::Foundation => "always-active/foundation",
            Guide::Brainstorming => "brainstorming",
            Guide::DeepResearch => "deep-research",
            Guide::Planning => "planning",
            Guide::Implementation => "implementation",
            Guide::Debug => "debug",
            Guide::Investigation => "investigation",
            Guide::Parallel => "parallel",
        }
    }

    fn patterns(self) -> &'static [&'static str] {
        match self {
            Guide::Foundation => &[],
            Guide::Brainstorming => &[r"\b(brainstorm|brainstorming)\b"],
            Guide::DeepResearch => &[r"\b(deep research)\b"],
            Guide::Planning => &[
                r"\b(make|create|develop|write|build).*\bplan\b",
                r"\bplan\s+(out|for|the)\b",
                r"\bplanning\s+(out|for|the)\b",
                r"\b(implementation|feature|system|architecture)\s+plan\b",
                r"\b(design a plan|map out|architect)\b",
            ],
            Guide::Implementation => &[
                r"\b(implement|build|create|develop|code|write|add).*\b(feature|function|component|service|module|class|view|entity)\b",
                r"\b(make|build|create|develop)\s+(this|it|the)\b",
                r"\b(let's|can you|please)\s+(implement|build|create|develop|code|write)\b",
                r"\bstart (implementing|building|coding|developing)\b",
                r"\b(fix|refactor|optimize|deploy|update|modify)\b",
            ],
            Guide::Debug => &[
                r"\b(debug|debugging|bug)\b",
                r"\b(why.*not work|what.*wrong|not working)\b",
                r"\b(crash|exception|error|failed|\^\^\^)\b",
                r"\b(build.*fail|compile.*error|runtime.*error)\b",
            ],
            Guide::Investigation => &[
                r"\b(investigate|research|analyze|examine|explore|understand)\b",
                r"\b(how does.*work|figure out|explain|find out)\b",
                r"\b(code review|audit|inspect)\b",
                r"\b(data.*flow|architecture|system.*design)\b",
            ],
            Guide::Parallel => &[
                r"\b(parallel|in parallel|concurrently|simultaneously)\b",
                r"\b(multiple agents|spawn agents|launch agents)\b",
                r"\b(batch|batches|paralleli[sz]e|paralleli[sz]ation)\b",
            ],
        }
    }

    fn regex(self) -> &'static Regex {
        static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
        let all = COMPILED.get_or_init(|| {
            Guide::ALL
                .iter()
                .map(|g| {
                    let alternation = g
                        .patterns()
                        .iter()
                        .map(|p| format!("(?:{p})"))
                        .collect::<Vec<_>>()
                        .join("|");
                    RegexBuilder::new(&alternation)
                        .case_insensitive(true)
                        .build()
                        .unwrap()
                })
                .collect()
        });
        &all[self as usize]
    }

    /// Whether `prompt` mentions this guide's keywords. The foundation guide
    /// has none.
    pub fn matches(self, prompt: &str) -> bool {
        !self.patterns().is_empty() && self.regex().is_match(prompt)
    }

    fn intro(self) -> &'static str {
        match self {
            Guide::Foundation => "Foundation professional development mode is active.",
            Guide::Brainstorming => {
                "The user has mentioned brainstorming or collaborative discovery."
            }
            Guide::DeepResearch => {
                "The user has requested deep research or systematic investigation."
            }
            Guide::Planning => {
                "The user has mentioned creating or making a plan for development. Here's some advice for making plans:"
            }
            Guide::Implementation => {
                "The user has mentioned implementing or building a feature/component."
            }
            Guide::Debug => {
                "The user has mentioned a key word or phrase that triggers this reminder for debugging."
            }
            Guide::Investigation => {
                "The user has mentioned a key word or phrase that triggers this reminder for investigation."
            }
            Guide::Parallel => "The user has mentioned parallel execution or agent delegation.",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Guide::Foundation => "developer-principles",
            Guide::Brainstorming => "brainstorming-workflow",
            Guide::DeepResearch => "deep-research-workflow",
            Guide::Planning => "planning-workflow",
            Guide::Implementation => "implementation-best-practices",
            Guide::Debug => "debugging-workflow",
            Guide::Investigation => "investigation-workflow",
            Guide::Parallel => "parallel-execution-workflow",
        }
    }

    /// Built-in text used when the project has no guide file. The foundation
    /// guide is project-specific and has none.
    fn fallback(self) -> Option<&'static str> {
        match self {
            Guide::Foundation => None,
            Guide::Brainstorming => Some(BRAINSTORMING_FALLBACK),
            Guide::DeepResearch => Some(DEEP_RESEARCH_FALLBACK),
            Guide::Planning => Some(PLANNING_FALLBACK),
            Guide::Implementation => Some(IMPLEMENTATION_FALLBACK),
            Guide::Debug => Some(DEBUG_FALLBACK),
            Guide::Investigation => Some(INVESTIGATION_FALLBACK),
            Guide::Parallel => Some(PARALLEL_FALLBACK),
        }
    }

    fn block(self, text: &str) -> String {
        format!(
            "<system-reminder>{intro}\n\n<{tag}>\n{text}\n</{tag}>\n\n</system-reminder>",
            intro = self.intro(),
            tag = self.tag(),
            text = text.trim_end(),
        )
    }
}

const BRAINSTORMING_FALLBACK: &str = "\
Ask one question at a time and wait for the answer.
Offer two or three distinct options with their trade-offs before converging.
Summarise what was decided and what is still open before any code is written.";

const DEEP_RESEARCH_FALLBACK: &str = "\
1. State the question and what a complete answer must cover.
2. Gather sources broadly, then read the most relevant ones in full.
3. Cross-check claims between sources and note where they disagree.
4. Report findings with references, separating facts from inference.";

const PLANNING_FALLBACK: &str = "\
Investigate before planning; a plan must not rest on assumptions.
A plan states: a summary, the motivation, how the current system works
(with file references), the new design, and anything else the implementer
needs. Leave out time estimates and generic advice.";

const IMPLEMENTATION_FALLBACK: &str = "\
1. Find and follow the existing patterns for this kind of change.
2. Validate inputs and handle the error paths, not just the happy path.
3. Add or update tests alongside the change.
4. Keep the change focused; note follow-ups instead of widening scope.";

const DEBUG_FALLBACK: &str = "\
1. Read the code involved end to end before guessing at causes.
2. List the five to eight most likely root causes, then pick the three most probable.
3. If the cause is obvious, fix it and say what it was.
4. Otherwise add broad logging first, narrow it once the failing area is known, and let the user run it.
5. Once fixed, remove every temporary log line, debug flag and hard-coded test value.";

const INVESTIGATION_FALLBACK: &str = "\
1. Start from the files the user named and read them fully.
2. For unfamiliar or large areas, search broadly before drawing conclusions.
3. Split independent areas into separate lines of inquiry and run them in parallel.
4. Answer the question first; implement only when asked.";

const PARALLEL_FALLBACK: &str = "\
Split the work into independent, non-overlapping tasks and launch them
together. Merge the results before acting on them.";

/// Keyword guides whose patterns match `prompt`, in injection order.
pub fn triggered(prompt: &str) -> Vec<Guide> {
    Guide::KEYWORD
        .into_iter()
        .filter(|g| g.matches(prompt))
        .collect()
}

/// Guide text from `<project>/.claude/guides/<stem>.md`, or the built-in
/// fallback when the project has none.
pub fn load_guide(project: Option<&Path>, guide: Guide) -> Option<String> {
    let fallback = || guide.fallback().map(str::to_string);
    let Some(project) = project else {
        return fallback();
    };
    let path = guide_path(project, guide.file_stem());
    match std::fs::read_to_string(&path) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => fallback(),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "unreadable guide");
            }
            fallback()
        }
    }
}

// ---------------------------------------------------------------------------
// Session ledger
// ---------------------------------------------------------------------------

/// Guides already injected in one session, per project directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLedger {
    #[serde(default)]
    pub projects: BTreeMap<String, BTreeSet<Guide>>,
}

impl SessionLedger {
    /// A missing or unreadable ledger is empty.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(path = %path.display(), error = %e, "unreadable workflow ledger");
                }
                return Self::default();
            }
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), error = %e, "corrupt workflow ledger");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        atomic_write(path, data.as_bytes())
    }

    pub fn injected(&self, project: &str) -> BTreeSet<Guide> {
        self.projects.get(project).cloned().unwrap_or_default()
    }

    pub fn mark(&mut self, project: &str, guides: impl IntoIterator<Item = Guide>) {
        self.projects
            .entry(project.to_string())
            .or_default()
            .extend(guides);
    }
}

fn project_key(project: Option<&Path>) -> String {
    project.map(|p| p.display().to_string()).unwrap_or_default()
}

/// Load the ledger, let `pick` choose new guides given the ones already
/// injected, then record the choice. Without a ledger path every call
/// starts from an empty set. A failed save is logged; the guides are still
/// returned.
fn with_ledger<T>(
    ledger_path: Option<&Path>,
    project: Option<&Path>,
    pick: impl FnOnce(&BTreeSet<Guide>) -> (T, Vec<Guide>),
) -> T {
    let key = project_key(project);
    let mut ledger = ledger_path.map(SessionLedger::load).unwrap_or_default();
    let already = ledger.injected(&key);
    let (out, picked) = pick(&already);

    if let Some(path) = ledger_path.filter(|_| !picked.is_empty()) {
        ledger.mark(&key, picked);
        if let Err(e) = ledger.save(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to save workflow ledger");
        }
    }
    out
}

/// Previously injected guides worth announcing, sorted by name.
fn still_active(already: &BTreeSet<Guide>) -> Vec<Guide> {
    let mut active: Vec<_> = already
        .iter()
        .copied()
        .filter(|g| *g != Guide::Foundation)
        .collect();
    active.sort_by_key(|g| g.name());
    active
}

fn announcement(new: &[Guide], already_active: &[Guide]) -> String {
    let join = |guides: &[Guide]| {
        guides
            .iter()
            .map(|g| g.name())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut parts = vec![format!("**New:** {}", join(new))];
    if !already_active.is_empty() {
        parts.push(format!("**Already active:** {}", join(already_active)));
    }
    format!("📋 Guides: {}", parts.join(" | "))
}

// ---------------------------------------------------------------------------
// UserPromptSubmit
// ---------------------------------------------------------------------------

/// The guides one prompt adds to the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Injection {
    pub new: Vec<Guide>,
    pub already_active: Vec<Guide>,
    #[serde(skip)]
    texts: Vec<String>,
}

impl Injection {
    /// Foundation first, then every matching keyword guide, skipping guides
    /// in `already` and guides with no text.
    pub fn plan(prompt: &str, project: Option<&Path>, already: &BTreeSet<Guide>) -> Self {
        let wanted = std::iter::once(Guide::Foundation).chain(triggered(prompt));
        let mut injection = Injection {
            already_active: still_active(already),
            ..Default::default()
        };
        for guide in wanted.filter(|g| !already.contains(g)) {
            if let Some(text) = load_guide(project, guide) {
                injection.new.push(guide);
                injection.texts.push(text);
            }
        }
        injection
    }

    pub fn is_empty(&self) -> bool {
        self.new.is_empty()
    }

    /// Hook output: the announcement instruction, then one block per guide.
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let header = format!(
            "<system-reminder>\nIMPORTANT: Workflow guides have been injected for this request.\n\nYou MUST announce this to the user at the START of your response using this exact format:\n{}\n\nThis announcement is mandatory - do not skip it. After the announcement, proceed with your response normally.\n</system-reminder>",
            announcement(&self.new, &self.already_active)
        );
        let mut blocks = vec![header];
        blocks.extend(
            self.new
                .iter()
                .zip(&self.texts)
                .map(|(guide, text)| guide.block(text)),
        );
        Some(blocks.join("\n\n"))
    }
}

/// Plan the injection for `prompt` against the session ledger at
/// `ledger_path` and record the new guides there.
pub fn remind(prompt: &str, project: Option<&Path>, ledger_path: Option<&Path>) -> Injection {
    with_ledger(ledger_path, project, |already| {
        let injection = Injection::plan(prompt, project, already);
        let picked = injection.new.clone();
        (injection, picked)
    })
}

// ---------------------------------------------------------------------------
// PostToolUse: parallelize a finished plan
// ---------------------------------------------------------------------------

/// After the plan-mode tool completes, ask for the plan to be split into
/// parallel stages. Fires once per session and project, and not at all
/// when a prompt already brought in the parallel guide.
pub fn after_plan(
    tool_name: &str,
    project: Option<&Path>,
    ledger_path: Option<&Path>,
) -> Option<String> {
    if tool_name != PLAN_EXIT_TOOL {
        return None;
    }
    with_ledger(ledger_path, project, |already| {
        if already.contains(&Guide::Parallel) {
            tracing::debug!("parallel guide already injected this session");
            return (None, Vec::new());
        }
        let Some(guide) = load_guide(project, Guide::Parallel) else {
            return (None, Vec::new());
        };
        let text = format!(
            "<system-reminder>\nIMPORTANT: Workflow guide has been injected for parallelization.\n\nYou MUST announce this to the user at the START of your response using this exact format:\n{announce}\n\n**Parallelize the Plan**\n\nThe initial plan has been drafted. Now, review and apply these parallelization principles:\n\n<{tag}>\n{guide}\n</{tag}>\n\n{requirements}\n\n</system-reminder>",
            announce = announcement(&[Guide::Parallel], &still_active(already)),
            tag = Guide::Parallel.tag(),
            guide = guide.trim_end(),
            requirements = PARALLEL_REQUIREMENTS,
        );
        (Some(text), vec![Guide::Parallel])
    })
}

const PARALLEL_REQUIREMENTS: &str = "\
CRITICAL ADDITIONAL REQUIREMENTS:
- ONLY use parallelization if there is more than one file to modify (with one file, implement it yourself)
- Delegate EVERY step, even single-task stages (unless trivial) to avoid clogging your context window
- No more than one primary task per agent
- Consider dependencies between components when planning parallel execution

Please present your analysis of parallel stages based on the guide above, then proceed with the first stage.";

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project_with(guides: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (stem, text) in guides {
            let path = guide_path(dir.path(), stem);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        }
        dir
    }

    #[test]
    fn guides_trigger_independently() {
        assert_eq!(triggered("Why is this not working?"), vec![Guide::Debug]);
        assert_eq!(triggered("Explain the data flow here"), vec![Guide::Investigation]);
        assert_eq!(
            triggered("please implement the login page"),
            vec![Guide::Implementation]
        );
        assert_eq!(triggered("refactor the parser"), vec![Guide::Implementation]);
        assert_eq!(triggered("plan out the migration"), vec![Guide::Planning]);
        assert_eq!(triggered("let's brainstorm names"), vec![Guide::Brainstorming]);
        assert_eq!(triggered("run these in parallel"), vec![Guide::Parallel]);
        assert_eq!(triggered("spawn agents per crate"), vec![Guide::Parallel]);
        assert!(triggered("thanks, looks good").is_empty());
    }

    #[test]
    fn deep_research_also_reads_as_investigation() {
        assert_eq!(
            triggered("do some deep research on caching"),
            vec![Guide::DeepResearch, Guide::Investigation]
        );
    }

    #[test]
    fn matching_is_case_insensitive_and_word_bounded() {
        assert_eq!(triggered("DEBUG this"), vec![Guide::Debug]);
        assert!(triggered("open the debugger panel").is_empty());
        assert!(!Guide::Foundation.matches("foundation"));
    }

    #[test]
    fn several_guides_keep_injection_order() {
        let got = triggered("investigate the crash, then plan for the fix in parallel");
        assert_eq!(
            got,
            vec![
                Guide::Planning,
                Guide::Implementation,
                Guide::Debug,
                Guide::Investigation,
                Guide::Parallel
            ]
        );
    }

    #[test]
    fn guide_file_overrides_fallback() {
        let dir = project_with(&[("debug", "Project debug checklist\n")]);
        assert_eq!(
            load_guide(Some(dir.path()), Guide::Debug).as_deref(),
            Some("Project debug checklist\n")
        );
        assert_eq!(
            load_guide(Some(dir.path()), Guide::Planning).as_deref(),
            Some(PLANNING_FALLBACK)
        );
        assert_eq!(load_guide(None, Guide::Parallel).as_deref(), Some(PARALLEL_FALLBACK));
        assert_eq!(load_guide(Some(dir.path()), Guide::Foundation), None);
    }

    #[test]
    fn foundation_leads_when_the_project_has_one() {
        let dir = project_with(&[("always-active/foundation", "Be precise.")]);
        let injection = Injection::plan("thanks", Some(dir.path()), &BTreeSet::new());
        assert_eq!(injection.new, vec![Guide::Foundation]);

        let out = injection.render().unwrap();
        assert!(out.contains("📋 Guides: **New:** FOUNDATION\n"));
        assert!(out.contains("<developer-principles>\nBe precise.\n</developer-principles>"));
    }

    #[test]
    fn no_guides_renders_nothing() {
        let injection = Injection::plan("hello", None, &BTreeSet::new());
        assert!(injection.is_empty());
        assert_eq!(injection.render(), None);
    }

    #[test]
    fn render_layout() {
        let out = Injection::plan("the build failed", None, &BTreeSet::new())
            .render()
            .unwrap();
        let blocks: Vec<_> = out.split("\n\n<system-reminder>").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("📋 Guides: **New:** DEBUG\n"));
        assert!(!blocks[0].contains("Already active"));
        assert!(blocks[1].contains("<debugging-workflow>\n1. Read the code"));
        assert!(out.ends_with("</system-reminder>"));
    }

    #[test]
    fn each_guide_is_injected_once_per_session() {
        let dir = project_with(&[("always-active/foundation", "Be precise.")]);
        let state = TempDir::new().unwrap();
        let ledger = state.path().join("s1.json");
        let project = Some(dir.path());

        let first = remind("debug this", project, Some(&ledger));
        assert_eq!(first.new, vec![Guide::Foundation, Guide::Debug]);

        let second = remind("still a bug", project, Some(&ledger));
        assert!(second.is_empty());

        let third = remind("another bug, plan out the fix", project, Some(&ledger));
        assert_eq!(third.new, vec![Guide::Planning, Guide::Implementation]);
        assert_eq!(third.already_active, vec![Guide::Debug]);
        assert!(third
            .render()
            .unwrap()
            .contains("**New:** PLANNING, IMPLEMENTATION | **Already active:** DEBUG\n"));
    }

    #[test]
    fn ledger_is_scoped_to_the_project() {
        let state = TempDir::new().unwrap();
        let ledger = state.path().join("s1.json");
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();

        assert_eq!(remind("debug", Some(a.path()), Some(&ledger)).new, vec![Guide::Debug]);
        assert_eq!(remind("debug", Some(b.path()), Some(&ledger)).new, vec![Guide::Debug]);
        assert!(remind("debug", Some(a.path()), Some(&ledger)).is_empty());
    }

    #[test]
    fn without_a_ledger_nothing_is_remembered() {
        assert_eq!(remind("debug", None, None).new, vec![Guide::Debug]);
        assert_eq!(remind("debug", None, None).new, vec![Guide::Debug]);
    }

    #[test]
    fn corrupt_ledger_reads_empty() {
        let state = TempDir::new().unwrap();
        let ledger = state.path().join("s1.json");
        std::fs::write(&ledger, "{not json").unwrap();
        assert_eq!(SessionLedger::load(&ledger), SessionLedger::default());
        assert_eq!(remind("debug", None, Some(&ledger)).new, vec![Guide::Debug]);

        let saved = SessionLedger::load(&ledger);
        assert_eq!(saved.injected(""), BTreeSet::from([Guide::Debug]));
    }

    #[test]
    fn after_plan_only_for_the_plan_tool() {
        assert_eq!(after_plan("Edit", None, None), None);
        let text = after_plan(PLAN_EXIT_TOOL, None, None).unwrap();
        assert!(text.contains("📋 Guides: **New:** PARALLEL\n"));
        assert!(text.contains("**Parallelize the Plan**"));
        assert!(text.contains("<parallel-execution-workflow>\nSplit the work"));
        assert!(text.ends_with("first stage.\n\n</system-reminder>"));
    }

    #[test]
    fn after_plan_shares_the_prompt_ledger() {
        let state = TempDir::new().unwrap();
        let ledger = state.path().join("s1.json");

        remind("the build failed", None, Some(&ledger));
        let text = after_plan(PLAN_EXIT_TOOL, None, Some(&ledger)).unwrap();
        assert!(text.contains("**New:** PARALLEL | **Already active:** DEBUG\n"));

        assert_eq!(after_plan(PLAN_EXIT_TOOL, None, Some(&ledger)), None);
        assert!(remind("do it in parallel", None, Some(&ledger)).is_empty());
    }
}
