//! Daily-report domain library: a markdown dialect for plan/result schedules,
//! todos, and notes, plus the derived views an editor needs (render slots,
//! drag-based time edits, next-day carryover). The core stays pure: every
//! operation takes its full input and returns fresh data.

pub mod core {
    use chrono::NaiveDate;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    /* ------------------------------- IDs ------------------------------- */

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EntryId(pub Uuid);

    impl EntryId {
        pub fn new() -> Self {
            Self(Uuid::new_v4())
        }
    }

    impl Default for EntryId {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Project code used for todo items that appear before any `###` subheading.
    pub const DEFAULT_PROJECT: &str = "MISC";

    /* ----------------------------- Schedule ----------------------------- */

    /// One line of a plan or result schedule.
    ///
    /// An entry with an empty project and an empty task is a bare-time marker:
    /// it only delimits the end of the previous block or the start of
    /// unscheduled time, and is never rendered as a task block itself.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ScheduleEntry {
        pub id: EntryId,
        /// Zero-padded `"HH:MM"`. Hours may pass 23 when the visible window
        /// crosses midnight, so this is not a `chrono::NaiveTime`.
        pub time: String,
        pub project: String,
        pub task: String,
    }

    impl ScheduleEntry {
        pub fn new(
            time: impl Into<String>,
            project: impl Into<String>,
            task: impl Into<String>,
        ) -> Self {
            Self {
                id: EntryId::new(),
                time: time.into(),
                project: project.into(),
                task: task.into(),
            }
        }

        pub fn marker(time: impl Into<String>) -> Self {
            Self::new(time, "", "")
        }

        pub fn is_marker(&self) -> bool {
            self.project.is_empty() && self.task.is_empty()
        }
    }

    /// Sorts ascending by time. The `"HH:MM"` strings are zero-padded, so the
    /// lexicographic order is the chronological order within the window.
    pub fn sort_entries(entries: &mut [ScheduleEntry]) {
        entries.sort_by(|a, b| a.time.cmp(&b.time));
    }

    /* ------------------------------- Todos ------------------------------- */

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TodoStatus {
        Pending,
        InProgress,
        Completed,
        OnHold,
    }

    impl TodoStatus {
        /// Status for a `- [M]` checkbox mark. Both `-` and `>` decode to
        /// `OnHold`; the duplication is in the dialect as written.
        pub fn from_mark(mark: char) -> Option<Self> {
            match mark {
                ' ' => Some(Self::Pending),
                'x' | 'X' => Some(Self::Completed),
                '*' => Some(Self::InProgress),
                '-' | '>' => Some(Self::OnHold),
                _ => None,
            }
        }

        /// Canonical mark for encoding. `OnHold` always encodes as `-`.
        pub fn mark(self) -> char {
            match self {
                Self::Pending => ' ',
                Self::InProgress => '*',
                Self::Completed => 'x',
                Self::OnHold => '-',
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Priority {
        High,
        Medium,
        Low,
    }

    impl Priority {
        /// Longest marker first, so `!!!` is never read as `!`.
        pub fn from_bangs(text: &str) -> Option<(Self, &str)> {
            for (bangs, priority) in [("!!!", Self::High), ("!!", Self::Medium), ("!", Self::Low)] {
                if let Some(rest) = text.strip_prefix(bangs) {
                    return Some((priority, rest));
                }
            }
            None
        }

        pub fn bangs(self) -> &'static str {
            match self {
                Self::High => "!!!",
                Self::Medium => "!!",
                Self::Low => "!",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TodoEntry {
        pub id: EntryId,
        pub status: TodoStatus,
        pub project: String,
        pub task: String,
        /// Newline-joined continuation lines from the markdown source.
        pub description: Option<String>,
        /// `"YYYY-MM-DD"`, shape-matched but never validated: an out-of-range
        /// month or day passes through untouched.
        pub deadline: Option<String>,
        pub priority: Option<Priority>,
    }

    impl TodoEntry {
        pub fn new(
            status: TodoStatus,
            project: impl Into<String>,
            task: impl Into<String>,
        ) -> Self {
            Self {
                id: EntryId::new(),
                status,
                project: project.into(),
                task: task.into(),
                description: None,
                deadline: None,
                priority: None,
            }
        }
    }

    /* ----------------------------- Aggregate ----------------------------- */

    /// Aggregate root: one day's report. Identity is the `date`; the hosting
    /// application owns loading and saving the markdown this maps to.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DailyReport {
        pub date: NaiveDate,
        pub author: String,
        pub plan: Vec<ScheduleEntry>,
        pub result: Vec<ScheduleEntry>,
        pub todos: Vec<TodoEntry>,
        pub notes: String,
    }

    impl DailyReport {
        pub fn new(date: NaiveDate, author: impl Into<String>) -> Self {
            Self {
                date,
                author: author.into(),
                plan: vec![],
                result: vec![],
                todos: vec![],
                notes: String::new(),
            }
        }
    }

    /* --------------------------- View settings --------------------------- */

    /// Numeric knobs the host supplies to the slot and drag layers. The
    /// fallback values apply field-by-field when a config source omits them.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct ViewConfig {
        /// Pixels per hour on the rendered timeline.
        #[serde(default = "ViewConfig::default_hour_height")]
        pub hour_height: f64,
        /// Draggable range measured in hours from midnight.
        #[serde(default = "ViewConfig::default_max_hours")]
        pub max_hours: i64,
        /// First visible hour.
        #[serde(default = "ViewConfig::default_start_hour")]
        pub start_hour: i64,
        /// Last visible hour.
        #[serde(default = "ViewConfig::default_end_hour")]
        pub end_hour: i64,
        /// Snap granularity for drag edits, in minutes.
        #[serde(default = "ViewConfig::default_snap_minutes")]
        pub snap_minutes: i64,
    }

    impl Default for ViewConfig {
        fn default() -> Self {
            Self {
                hour_height: Self::default_hour_height(),
                max_hours: Self::default_max_hours(),
                start_hour: Self::default_start_hour(),
                end_hour: Self::default_end_hour(),
                snap_minutes: Self::default_snap_minutes(),
            }
        }
    }

    impl ViewConfig {
        fn default_hour_height() -> f64 {
            60.0
        }
        fn default_max_hours() -> i64 {
            36
        }
        fn default_start_hour() -> i64 {
            8
        }
        fn default_end_hour() -> i64 {
            20
        }
        fn default_snap_minutes() -> i64 {
            15
        }
    }

    /* ---------------------------- Errors (domain) ---------------------------- */

    #[derive(Debug, thiserror::Error)]
    pub enum DomainError {
        #[error("invalid time of day: {0:?}")]
        InvalidTime(String),
        #[error("invalid report date: {0:?}")]
        InvalidDate(String),
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn entries_sort_lexicographically_by_time() {
            let mut entries = vec![
                ScheduleEntry::new("10:00", "B", "b"),
                ScheduleEntry::marker("08:30"),
                ScheduleEntry::new("09:15", "A", "a"),
            ];
            sort_entries(&mut entries);
            let times: Vec<&str> = entries.iter().map(|e| e.time.as_str()).collect();
            assert_eq!(times, ["08:30", "09:15", "10:00"]);
        }

        #[test]
        fn both_hold_marks_decode_to_on_hold() {
            assert_eq!(TodoStatus::from_mark('-'), Some(TodoStatus::OnHold));
            assert_eq!(TodoStatus::from_mark('>'), Some(TodoStatus::OnHold));
            assert_eq!(TodoStatus::OnHold.mark(), '-');
        }

        #[test]
        fn priority_markers_match_longest_first() {
            assert_eq!(
                Priority::from_bangs("!!!urgent"),
                Some((Priority::High, "urgent"))
            );
            assert_eq!(Priority::from_bangs("!! x"), Some((Priority::Medium, " x")));
            assert_eq!(Priority::from_bangs("!x"), Some((Priority::Low, "x")));
            assert_eq!(Priority::from_bangs("plain"), None);
        }
    }
}

pub mod time {
    //! `HH:MM` parsing and formatting over plain minute offsets from midnight.
    //! Hours up to 47 are accepted so a late-night window (`start_hour +
    //! max_hours` past 24) can still be expressed in the dialect.

    use crate::core::DomainError;

    /// Parses `H:MM`/`HH:MM` into minutes from midnight. Returns `None` for
    /// anything else; callers that tolerate bad input skip the line instead.
    pub fn parse_hhmm(s: &str) -> Option<i64> {
        let (hours, minutes) = s.split_once(':')?;
        if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
            return None;
        }
        if !hours.bytes().all(|b| b.is_ascii_digit())
            || !minutes.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let h: i64 = hours.parse().ok()?;
        let m: i64 = minutes.parse().ok()?;
        if h > 47 || m > 59 {
            return None;
        }
        Some(h * 60 + m)
    }

    /// Strict variant for call sites that must surface the failure.
    pub fn to_minutes(s: &str) -> Result<i64, DomainError> {
        parse_hhmm(s).ok_or_else(|| DomainError::InvalidTime(s.to_string()))
    }

    /// Signed gap from `a` to `b`, both minute offsets from midnight.
    pub fn minutes_between(a: i64, b: i64) -> i64 {
        b - a
    }

    /// Zero-padded `"HH:MM"`. Negative offsets clamp to midnight.
    pub fn format_minutes(total: i64) -> String {
        let total = total.max(0);
        format!("{:02}:{:02}", total / 60, total % 60)
    }

}

pub mod parser {
    //! Markdown decoder for the report dialect.
    //!
    //! The outer scan is an explicit line state machine over the four `##`
    //! sections; the todo side channel (current project, open continuation
    //! run) is threaded through the fold rather than kept as global scan
    //! state. Line contents are parsed with `nom` combinators. Decoding is
    //! permissive: a line that matches no pattern is skipped, never fatal.

    use crate::core::{
        DEFAULT_PROJECT, DailyReport, DomainError, Priority, ScheduleEntry, TodoEntry, TodoStatus,
    };
    use crate::time;
    use anyhow::{Context, Result};
    use chrono::{Datelike, Local, NaiveDate};
    use nom::{
        IResult,
        bytes::complete::{tag, take_while},
        character::complete::{char, digit1, one_of, space0},
        combinator::recognize,
        error::{VerboseError, VerboseErrorKind},
        sequence::tuple,
    };
    use std::{fs, path::Path};

    /* ------------------------ Public entry points ------------------------ */

    /// Decodes a full report from markdown. The date and author are the
    /// caller's to supply; the dialect itself carries neither.
    pub fn parse_report_from_str(date: NaiveDate, author: &str, input: &str) -> DailyReport {
        parse_report_with_year(date, author, input, Local::now().year())
    }

    /// Same as [`parse_report_from_str`] with an explicit year for completing
    /// short `@MM-DD` deadlines.
    pub fn parse_report_with_year(
        date: NaiveDate,
        author: &str,
        input: &str,
        year: i32,
    ) -> DailyReport {
        let mut scan = Scan::new(date, author, year);
        for line in input.lines() {
            scan.step(line);
        }
        scan.finish()
    }

    /// Parsing seam for file-backed reports. The report date comes from the
    /// `YYYY-MM-DD` file stem.
    pub trait ReportParser {
        fn parse_file(&self, abs_path: &Path) -> Result<DailyReport>;
    }

    pub struct MarkdownReportParser;

    impl ReportParser for MarkdownReportParser {
        fn parse_file(&self, abs_path: &Path) -> Result<DailyReport> {
            let text =
                fs::read_to_string(abs_path).with_context(|| format!("reading {:?}", abs_path))?;
            let date = date_from_path(abs_path)?;
            Ok(parse_report_from_str(date, "", &text))
        }
    }

    pub fn date_from_path(path: &Path) -> Result<NaiveDate> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| DomainError::InvalidDate(path.display().to_string()))?;
        let date = stem
            .parse::<NaiveDate>()
            .map_err(|_| DomainError::InvalidDate(stem.to_string()))?;
        Ok(date)
    }

    /* --------------------------- Scan machine --------------------------- */

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Section {
        None,
        Plan,
        Result,
        Todo,
        Note,
    }

    struct Scan {
        section: Section,
        todo_project: String,
        /// True while the previous line was a todo item or one of its
        /// continuation lines; indented lines attach only inside a run.
        todo_run: bool,
        year: i32,
        report: DailyReport,
        note_lines: Vec<String>,
    }

    impl Scan {
        fn new(date: NaiveDate, author: &str, year: i32) -> Self {
            Self {
                section: Section::None,
                todo_project: DEFAULT_PROJECT.to_string(),
                todo_run: false,
                year,
                report: DailyReport::new(date, author),
                note_lines: vec![],
            }
        }

        fn step(&mut self, line: &str) {
            if let Some(section) = section_header(line) {
                self.section = section;
                self.todo_run = false;
                if section == Section::Todo {
                    self.todo_project = DEFAULT_PROJECT.to_string();
                }
                return;
            }

            match self.section {
                Section::None => {}
                Section::Plan => {
                    if let Ok((_, entry)) = schedule_line(line) {
                        self.report.plan.push(entry);
                    }
                }
                Section::Result => {
                    if let Ok((_, entry)) = schedule_line(line) {
                        self.report.result.push(entry);
                    }
                }
                Section::Todo => self.step_todo(line),
                Section::Note => self.note_lines.push(line.to_string()),
            }
        }

        fn step_todo(&mut self, line: &str) {
            if let Some(code) = project_heading(line) {
                self.todo_project = code.to_string();
                self.todo_run = false;
                return;
            }

            // Continuation lines extend the previous item's description until
            // a non-indented or non-matching line breaks the run.
            if self.todo_run && line.starts_with("  ") && !line.trim().is_empty() {
                if let Some(last) = self.report.todos.last_mut() {
                    let text = line.trim();
                    match &mut last.description {
                        Some(desc) => {
                            desc.push('\n');
                            desc.push_str(text);
                        }
                        None => last.description = Some(text.to_string()),
                    }
                    return;
                }
            }

            if let Ok((_, (status, text))) = todo_line(line) {
                self.report
                    .todos
                    .push(build_todo(status, text, &self.todo_project, self.year));
                self.todo_run = true;
            } else {
                self.todo_run = false;
            }
        }

        fn finish(mut self) -> DailyReport {
            while self.note_lines.last().is_some_and(|l| l.trim().is_empty()) {
                self.note_lines.pop();
            }
            while self.note_lines.first().is_some_and(|l| l.trim().is_empty()) {
                self.note_lines.remove(0);
            }
            self.report.notes = self.note_lines.join("\n");
            self.report
        }
    }

    fn section_header(line: &str) -> Option<Section> {
        match line.trim_end() {
            "## [PLAN]" => Some(Section::Plan),
            "## [RESULT]" => Some(Section::Result),
            "## [TODO]" => Some(Section::Todo),
            "## [NOTE]" => Some(Section::Note),
            _ => None,
        }
    }

    fn project_heading(line: &str) -> Option<&str> {
        let code = line.strip_prefix("### ")?.trim();
        (!code.is_empty()).then_some(code)
    }

    /* ---------------------------- Line parsers ---------------------------- */

    type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

    fn context_err<'a, T>(i: &'a str, label: &'static str) -> PResult<'a, T> {
        Err(nom::Err::Error(VerboseError {
            errors: vec![(i, VerboseErrorKind::Context(label))],
        }))
    }

    fn hhmm(i: &str) -> PResult<'_, i64> {
        let (i, raw) = recognize(tuple((digit1, char(':'), digit1)))(i)?;
        match time::parse_hhmm(raw) {
            Some(minutes) => Ok((i, minutes)),
            None => context_err(i, "hhmm"),
        }
    }

    /// `* HH:MM [PROJECT] task text` or the bare `* HH:MM` end marker.
    /// The project brackets may be empty; only the bare form is a marker.
    /// The stored time is re-rendered zero-padded so list sorting stays
    /// lexicographic.
    fn schedule_line(i: &str) -> PResult<'_, ScheduleEntry> {
        let (i, _) = tag("* ")(i)?;
        let (i, minutes) = hhmm(i)?;
        let time = time::format_minutes(minutes);
        let (i, _) = space0(i)?;
        if i.is_empty() {
            return Ok((i, ScheduleEntry::marker(time)));
        }
        let (i, _) = char('[')(i)?;
        let (i, project) = take_while(|c| c != ']')(i)?;
        let (i, _) = char(']')(i)?;
        let (i, _) = space0(i)?;
        Ok(("", ScheduleEntry::new(time, project.trim(), i.trim_end())))
    }

    /// `- [M] text` where `M` is one of the status marks.
    fn todo_line(i: &str) -> PResult<'_, (TodoStatus, &str)> {
        let (i, _) = tag("- [")(i)?;
        let (i, mark) = one_of(" xX*->")(i)?;
        let (i, _) = char(']')(i)?;
        let (i, _) = space0(i)?;
        let Some(status) = TodoStatus::from_mark(mark) else {
            return context_err(i, "todo-mark");
        };
        Ok(("", (status, i.trim_end())))
    }

    /* ------------------------- Todo item extraction ------------------------- */

    /// Extraction order is fixed: project override, priority bangs, deadline
    /// (end of text first, then start), remainder as task.
    fn build_todo(status: TodoStatus, text: &str, current_project: &str, year: i32) -> TodoEntry {
        let mut rest = text.trim();
        let mut project = current_project.to_string();

        if let Some(after) = rest.strip_prefix('[') {
            if let Some(close) = after.find(']') {
                let code = after[..close].trim();
                if !code.is_empty() {
                    project = code.to_string();
                    rest = after[close + 1..].trim_start();
                }
            }
        }

        let mut priority = None;
        if let Some((p, after)) = Priority::from_bangs(rest) {
            priority = Some(p);
            rest = after.trim_start();
        }

        let (deadline, task) = take_deadline(rest, year);

        let mut todo = TodoEntry::new(status, project, task);
        todo.priority = priority;
        todo.deadline = deadline;
        todo
    }

    fn take_deadline(rest: &str, year: i32) -> (Option<String>, String) {
        let rest = rest.trim();
        match rest.rsplit_once(' ') {
            Some((head, tail)) => {
                if let Some(deadline) = deadline_token(tail, year) {
                    return (Some(deadline), head.trim_end().to_string());
                }
            }
            None => {
                if let Some(deadline) = deadline_token(rest, year) {
                    return (Some(deadline), String::new());
                }
            }
        }
        if let Some((head, tail)) = rest.split_once(' ') {
            if let Some(deadline) = deadline_token(head, year) {
                return (Some(deadline), tail.trim_start().to_string());
            }
        }
        (None, rest.to_string())
    }

    /// `@YYYY-MM-DD` or `@MM-DD`; the short form is completed with the
    /// decode-time year. Digits are shape-matched only, month and day ranges
    /// are the caller's concern.
    fn deadline_token(token: &str, year: i32) -> Option<String> {
        fn digits(s: &str, len: usize) -> bool {
            s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
        }

        let body = token.strip_prefix('@')?;
        let parts: Vec<&str> = body.split('-').collect();
        match parts.as_slice() {
            [y, m, d] if digits(y, 4) && digits(m, 2) && digits(d, 2) => Some(body.to_string()),
            [m, d] if digits(m, 2) && digits(d, 2) => Some(format!("{year}-{body}")),
            _ => None,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::{Priority, TodoStatus};
        use std::io::Write;

        fn date() -> NaiveDate {
            NaiveDate::from_ymd_opt(2026, 8, 28).unwrap()
        }

        #[test]
        fn schedule_lines_decode_in_line_order_without_sorting() {
            let input = "## [PLAN]\n* 10:00 [P2] later\n* 09:00 [P1] earlier\n";
            let report = parse_report_from_str(date(), "aya", input);
            assert_eq!(report.plan.len(), 2);
            assert_eq!(report.plan[0].time, "10:00");
            assert_eq!(report.plan[0].project, "P2");
            assert_eq!(report.plan[1].task, "earlier");
        }

        #[test]
        fn bare_time_lines_become_markers() {
            let input = "## [RESULT]\n* 09:00 [P1] work\n* 12:30\n";
            let report = parse_report_from_str(date(), "", input);
            assert_eq!(report.result.len(), 2);
            assert!(!report.result[0].is_marker());
            assert!(report.result[1].is_marker());
            assert_eq!(report.result[1].time, "12:30");
        }

        #[test]
        fn empty_project_brackets_decode_without_losing_the_entry() {
            let input = "## [PLAN]\n* 09:00 [] task only\n* 10:00 []\n";
            let report = parse_report_from_str(date(), "", input);
            assert_eq!(report.plan.len(), 2);
            assert_eq!(report.plan[0].project, "");
            assert_eq!(report.plan[0].task, "task only");
            assert!(!report.plan[0].is_marker());
            // An empty pair with no task carries nothing and is a marker.
            assert!(report.plan[1].is_marker());
        }

        #[test]
        fn unpadded_hours_are_normalized() {
            let input = "## [PLAN]\n* 9:05 [P1] x\n";
            let report = parse_report_from_str(date(), "", input);
            assert_eq!(report.plan[0].time, "09:05");
        }

        #[test]
        fn malformed_lines_are_skipped_not_fatal() {
            let input = "## [PLAN]\n* nonsense\n*09:00 [P] no space\n* 09:00 trailing junk\n- [ ] todo in wrong section\n* 10:00 [P1] ok\n";
            let report = parse_report_from_str(date(), "", input);
            assert_eq!(report.plan.len(), 1);
            assert_eq!(report.plan[0].task, "ok");
        }

        #[test]
        fn lines_outside_any_section_are_ignored() {
            let input = "* 09:00 [P1] floating\nrandom text\n## [PLAN]\n* 10:00 [P1] kept\n";
            let report = parse_report_from_str(date(), "", input);
            assert_eq!(report.plan.len(), 1);
            assert_eq!(report.plan[0].task, "kept");
        }

        #[test]
        fn todo_extraction_runs_in_fixed_order() {
            let input = "## [TODO]\n### OPS\n- [ ] [P34] !! review @12-25\n";
            let report = parse_report_with_year(date(), "", input, 2026);
            let todo = &report.todos[0];
            assert_eq!(todo.status, TodoStatus::Pending);
            assert_eq!(todo.project, "P34");
            assert_eq!(todo.priority, Some(Priority::Medium));
            assert_eq!(todo.deadline.as_deref(), Some("2026-12-25"));
            assert_eq!(todo.task, "review");
        }

        #[test]
        fn subheading_sets_project_and_fallback_applies_before_any() {
            let input = "## [TODO]\n- [ ] orphan\n### CORE\n- [x] shipped\n";
            let report = parse_report_from_str(date(), "", input);
            assert_eq!(report.todos[0].project, DEFAULT_PROJECT);
            assert_eq!(report.todos[1].project, "CORE");
            assert_eq!(report.todos[1].status, TodoStatus::Completed);
        }

        #[test]
        fn deadline_at_end_wins_over_start() {
            let input = "## [TODO]\n- [ ] @01-02 ship @2026-03-04\n";
            let report = parse_report_with_year(date(), "", input, 2026);
            let todo = &report.todos[0];
            assert_eq!(todo.deadline.as_deref(), Some("2026-03-04"));
            // The start token stays literal text once the end matched.
            assert_eq!(todo.task, "@01-02 ship");
        }

        #[test]
        fn deadline_at_start_applies_when_end_absent() {
            let input = "## [TODO]\n- [*] @02-14 prepare slides\n";
            let report = parse_report_with_year(date(), "", input, 2026);
            let todo = &report.todos[0];
            assert_eq!(todo.status, TodoStatus::InProgress);
            assert_eq!(todo.deadline.as_deref(), Some("2026-02-14"));
            assert_eq!(todo.task, "prepare slides");
        }

        #[test]
        fn out_of_range_deadline_digits_pass_through() {
            let input = "## [TODO]\n- [ ] pay invoices @13-99\n";
            let report = parse_report_with_year(date(), "", input, 2026);
            assert_eq!(report.todos[0].deadline.as_deref(), Some("2026-13-99"));
        }

        #[test]
        fn hold_marks_are_synonyms_on_decode() {
            let input = "## [TODO]\n- [-] blocked\n- [>] blocked too\n";
            let report = parse_report_from_str(date(), "", input);
            assert_eq!(report.todos[0].status, TodoStatus::OnHold);
            assert_eq!(report.todos[1].status, TodoStatus::OnHold);
        }

        #[test]
        fn continuation_lines_accumulate_into_description() {
            let input = "## [TODO]\n- [ ] write minutes\n  first detail\n  second detail\nnot indented\n  detached line\n";
            let report = parse_report_from_str(date(), "", input);
            assert_eq!(report.todos.len(), 1);
            assert_eq!(
                report.todos[0].description.as_deref(),
                Some("first detail\nsecond detail")
            );
        }

        #[test]
        fn note_section_keeps_free_text() {
            let input = "## [NOTE]\nfirst line\n\nsecond paragraph\n\n";
            let report = parse_report_from_str(date(), "", input);
            assert_eq!(report.notes, "first line\n\nsecond paragraph");
        }

        #[test]
        fn full_document_fills_every_list() {
            let input = "\
## [PLAN]
* 09:00 [P1] plan work

## [RESULT]
* 09:10 [P1] actual work
* 12:00

## [TODO]
### P1
- [ ] follow up

## [NOTE]
went long
";
            let report = parse_report_from_str(date(), "aya", input);
            assert_eq!(report.plan.len(), 1);
            assert_eq!(report.result.len(), 2);
            assert_eq!(report.todos.len(), 1);
            assert_eq!(report.notes, "went long");
            assert_eq!(report.author, "aya");
        }

        #[test]
        fn file_seam_derives_date_from_stem() {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("2026-08-28.md");
            let mut file = std::fs::File::create(&path).expect("create");
            writeln!(file, "## [PLAN]\n* 09:00 [P1] work").expect("write");

            let report = MarkdownReportParser.parse_file(&path).expect("parse");
            assert_eq!(report.date, date());
            assert_eq!(report.plan.len(), 1);
        }

        #[test]
        fn file_seam_rejects_undateable_stem() {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("notes.md");
            std::fs::write(&path, "## [NOTE]\nhi\n").expect("write");
            assert!(MarkdownReportParser.parse_file(&path).is_err());
        }
    }
}

pub mod format {
    //! Canonical markdown encoder. Schedules are time-sorted on the way out;
    //! todos group under `###` subheadings in first-seen project order; the
    //! on-hold mark always encodes as `-` even though decode accepts `>`.

    use crate::core::{DailyReport, ScheduleEntry, TodoEntry, sort_entries};
    use indexmap::IndexMap;

    pub fn format_report(report: &DailyReport) -> String {
        let mut out = String::new();
        render_schedule_section(&mut out, "## [PLAN]", &report.plan);
        out.push('\n');
        render_schedule_section(&mut out, "## [RESULT]", &report.result);
        out.push('\n');
        render_todo_section(&mut out, &report.todos);
        out.push('\n');
        out.push_str("## [NOTE]\n");
        if !report.notes.is_empty() {
            out.push_str(&report.notes);
            if !report.notes.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }

    fn render_schedule_section(out: &mut String, header: &str, entries: &[ScheduleEntry]) {
        out.push_str(header);
        out.push('\n');
        let mut sorted = entries.to_vec();
        sort_entries(&mut sorted);
        for entry in &sorted {
            out.push_str("* ");
            out.push_str(&entry.time);
            if !entry.is_marker() {
                out.push_str(" [");
                out.push_str(&entry.project);
                out.push(']');
                if !entry.task.is_empty() {
                    out.push(' ');
                    out.push_str(&entry.task);
                }
            }
            out.push('\n');
        }
    }

    fn render_todo_section(out: &mut String, todos: &[TodoEntry]) {
        out.push_str("## [TODO]\n");
        let mut grouped: IndexMap<&str, Vec<&TodoEntry>> = IndexMap::new();
        for todo in todos {
            grouped.entry(todo.project.as_str()).or_default().push(todo);
        }
        for (project, items) in &grouped {
            out.push_str("### ");
            out.push_str(project);
            out.push('\n');
            for todo in items {
                render_todo_line(out, todo);
            }
        }
    }

    fn render_todo_line(out: &mut String, todo: &TodoEntry) {
        out.push_str("- [");
        out.push(todo.status.mark());
        out.push(']');
        if let Some(priority) = todo.priority {
            out.push(' ');
            out.push_str(priority.bangs());
        }
        if !todo.task.is_empty() {
            out.push(' ');
            out.push_str(&todo.task);
        }
        if let Some(deadline) = &todo.deadline {
            out.push_str(" @");
            out.push_str(deadline);
        }
        out.push('\n');
        if let Some(description) = &todo.description {
            for line in description.lines() {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
        }
    }

}

pub mod projectors {
    pub mod slot_projector {
        //! Turns a sparse schedule into continuous render slots: durations are
        //! inferred from each entry's successor, bare-time markers become
        //! break slots, and everything fully outside the visible window is
        //! clipped from the output (the underlying list is untouched).

        use crate::core::{EntryId, ScheduleEntry, ViewConfig};
        use crate::time;
        use serde::Serialize;

        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct SlotOptions {
            pub start_hour: i64,
            pub total_hours: i64,
            pub hour_height: f64,
        }

        impl SlotOptions {
            pub fn from_config(cfg: &ViewConfig) -> Self {
                Self {
                    start_hour: cfg.start_hour,
                    total_hours: cfg.end_hour - cfg.start_hour,
                    hour_height: cfg.hour_height,
                }
            }

            pub fn window_start(&self) -> i64 {
                self.start_hour * 60
            }

            pub fn window_end(&self) -> i64 {
                (self.start_hour + self.total_hours) * 60
            }
        }

        /// Derived, display-only slot. Recomputed on every call; never stored.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct RenderSlot {
            pub id: EntryId,
            pub time: String,
            pub project: String,
            pub task: String,
            pub start_minutes: i64,
            pub duration: i64,
            pub is_break: bool,
        }

        impl RenderSlot {
            pub fn pixel_offset(&self, opts: &SlotOptions) -> f64 {
                (self.start_minutes - opts.window_start()) as f64 / 60.0 * opts.hour_height
            }

            pub fn pixel_height(&self, opts: &SlotOptions) -> f64 {
                self.duration as f64 / 60.0 * opts.hour_height
            }
        }

        pub fn project_slots(entries: &[ScheduleEntry], opts: &SlotOptions) -> Vec<RenderSlot> {
            // Pass 1: parse times and sort; entries with unparseable times
            // are not renderable.
            let mut timed: Vec<(i64, &ScheduleEntry)> = entries
                .iter()
                .filter_map(|e| time::parse_hhmm(&e.time).map(|m| (m, e)))
                .collect();
            timed.sort_by_key(|(minutes, _)| *minutes);

            // Pass 2: each duration comes from peeking at the next index.
            let mut out = Vec::with_capacity(timed.len());
            for (idx, (minutes, entry)) in timed.iter().enumerate() {
                let next = timed.get(idx + 1).map(|(m, _)| *m);
                if entry.is_marker() {
                    // A trailing marker only closes the previous block; a
                    // marker with a successor spans the gap as a break.
                    let Some(next_minutes) = next else { continue };
                    out.push(RenderSlot {
                        id: entry.id,
                        time: entry.time.clone(),
                        project: String::new(),
                        task: String::new(),
                        start_minutes: *minutes,
                        duration: time::minutes_between(*minutes, next_minutes).max(0),
                        is_break: true,
                    });
                } else {
                    let end = next.unwrap_or_else(|| opts.window_end());
                    out.push(RenderSlot {
                        id: entry.id,
                        time: entry.time.clone(),
                        project: entry.project.clone(),
                        task: entry.task.clone(),
                        start_minutes: *minutes,
                        duration: time::minutes_between(*minutes, end).max(0),
                        is_break: false,
                    });
                }
            }

            out.retain(|slot| overlaps_window(slot, opts));
            out
        }

        fn overlaps_window(slot: &RenderSlot, opts: &SlotOptions) -> bool {
            let start = opts.window_start();
            let end = opts.window_end();
            if slot.duration == 0 {
                return slot.start_minutes >= start && slot.start_minutes < end;
            }
            slot.start_minutes < end && slot.start_minutes + slot.duration > start
        }

    }

    pub mod carryover_projector {
        //! Seeds a fresh report for a new date from the previous day's
        //! unfinished todos. Copies get fresh ids; completed items stay
        //! behind; duplicates collapse on (project, normalized task).

        use crate::core::{DailyReport, EntryId, TodoStatus};
        use chrono::NaiveDate;
        use std::collections::BTreeSet;

        pub fn build_next_day(previous: &DailyReport, date: NaiveDate) -> DailyReport {
            let mut report = DailyReport::new(date, previous.author.clone());
            let mut seen: BTreeSet<(String, String)> = BTreeSet::new();

            for todo in &previous.todos {
                if todo.status == TodoStatus::Completed {
                    continue;
                }
                let key = (todo.project.clone(), normalize(&todo.task));
                if !seen.insert(key) {
                    continue;
                }
                let mut copy = todo.clone();
                copy.id = EntryId::new();
                report.todos.push(copy);
            }

            report
        }

        fn normalize(s: &str) -> String {
            s.trim().to_lowercase()
        }

        #[cfg(test)]
        mod tests {
            use super::*;
            use crate::core::{DailyReport, Priority, TodoEntry, TodoStatus};
            use chrono::NaiveDate;

            fn day(d: u32) -> NaiveDate {
                NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
            }

            #[test]
            fn carries_unfinished_todos_with_fresh_ids() {
                let mut previous = DailyReport::new(day(27), "aya");
                let mut pending = TodoEntry::new(TodoStatus::Pending, "P1", "write report");
                pending.priority = Some(Priority::High);
                pending.deadline = Some("2026-09-01".to_string());
                let done = TodoEntry::new(TodoStatus::Completed, "P1", "old chore");
                let held = TodoEntry::new(TodoStatus::OnHold, "OPS", "waiting on infra");
                previous.todos = vec![pending.clone(), done, held.clone()];
                previous.notes = "yesterday's notes".to_string();

                let next = build_next_day(&previous, day(28));

                assert_eq!(next.date, day(28));
                assert_eq!(next.author, "aya");
                assert!(next.plan.is_empty());
                assert!(next.result.is_empty());
                assert!(next.notes.is_empty());

                assert_eq!(next.todos.len(), 2);
                assert_eq!(next.todos[0].task, "write report");
                assert_eq!(next.todos[0].status, TodoStatus::Pending);
                assert_eq!(next.todos[0].priority, Some(Priority::High));
                assert_eq!(next.todos[0].deadline.as_deref(), Some("2026-09-01"));
                assert_ne!(next.todos[0].id, pending.id);
                assert_eq!(next.todos[1].status, TodoStatus::OnHold);
                assert_ne!(next.todos[1].id, held.id);
            }

            #[test]
            fn duplicate_tasks_collapse_on_project_and_title() {
                let mut previous = DailyReport::new(day(27), "");
                previous.todos = vec![
                    TodoEntry::new(TodoStatus::Pending, "P1", "Sync Notes"),
                    TodoEntry::new(TodoStatus::OnHold, "P1", "sync notes "),
                    TodoEntry::new(TodoStatus::Pending, "P2", "sync notes"),
                ];
                let next = build_next_day(&previous, day(28));
                assert_eq!(next.todos.len(), 2);
                assert_eq!(next.todos[0].project, "P1");
                assert_eq!(next.todos[1].project, "P2");
            }
        }
    }
}

pub mod drag {
    //! Drag-gesture engine for retiming schedule entries. The host subscribes
    //! to its own pointer events and feeds coordinates through an explicit
    //! begin/update/end API; the engine holds no listeners and never fails,
    //! it snaps and clamps instead.

    use crate::core::{DomainError, EntryId, ScheduleEntry, ViewConfig, sort_entries};
    use crate::time;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ScheduleList {
        Plan,
        Result,
    }

    /// One in-flight gesture: grabbed entry, owning list, original start
    /// minute, and the pointer's origin. Resolved by [`DragGesture::end`].
    #[derive(Debug, Clone)]
    pub struct DragGesture {
        list: ScheduleList,
        entry: EntryId,
        origin_minutes: i64,
        origin_px: f64,
        current_px: f64,
        /// Set when a break slot was grabbed: the break's rendered length,
        /// so a plan-to-result copy can preserve it.
        break_len: Option<i64>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum DragOutcome {
        /// A click without net movement, or a drop that resolves nowhere.
        NoChange,
        /// In-place retime: a replacement for the gesture's own list.
        Moved {
            list: ScheduleList,
            entries: Vec<ScheduleEntry>,
        },
        /// Plan entry dropped on the result area: a replacement result list
        /// containing the translated copy. The plan list is untouched.
        Copied { result: Vec<ScheduleEntry> },
    }

    impl DragGesture {
        pub fn begin(
            list: ScheduleList,
            entry: EntryId,
            origin_minutes: i64,
            pointer_px: f64,
            break_len: Option<i64>,
        ) -> Self {
            Self {
                list,
                entry,
                origin_minutes,
                origin_px: pointer_px,
                current_px: pointer_px,
                break_len,
            }
        }

        /// Convenience constructor that reads the origin minutes off the
        /// grabbed entry itself.
        pub fn grab(
            list: ScheduleList,
            entry: &ScheduleEntry,
            pointer_px: f64,
            break_len: Option<i64>,
        ) -> Result<Self, DomainError> {
            let origin_minutes = time::to_minutes(&entry.time)?;
            Ok(Self::begin(
                list,
                entry.id,
                origin_minutes,
                pointer_px,
                break_len,
            ))
        }

        pub fn list(&self) -> ScheduleList {
            self.list
        }

        pub fn entry(&self) -> EntryId {
            self.entry
        }

        /// Feeds a pointer-move event; returns the snapped preview minutes.
        pub fn update(&mut self, pointer_px: f64, cfg: &ViewConfig) -> i64 {
            self.current_px = pointer_px;
            self.snapped_minutes(cfg)
        }

        /// Pixel delta to minutes, snapped to the grid, clamped so the entry
        /// never lands inside the last hour of the draggable range.
        pub fn snapped_minutes(&self, cfg: &ViewConfig) -> i64 {
            let raw = (self.current_px - self.origin_px) / cfg.hour_height * 60.0;
            let shifted = (raw + self.origin_minutes as f64).round() as i64;
            let snap = cfg.snap_minutes.max(1);
            let snapped = ((shifted as f64 / snap as f64).round() as i64) * snap;
            let upper = (cfg.start_hour + cfg.max_hours) * 60 - 60;
            snapped.clamp(0, upper)
        }

        /// Resolves the gesture on pointer-up. `over` names the list area
        /// under the release point, if any.
        pub fn end(
            mut self,
            pointer_px: f64,
            over: Option<ScheduleList>,
            plan: &[ScheduleEntry],
            result: &[ScheduleEntry],
            cfg: &ViewConfig,
        ) -> DragOutcome {
            self.current_px = pointer_px;
            if self.current_px == self.origin_px {
                return DragOutcome::NoChange;
            }
            let snapped = self.snapped_minutes(cfg);

            if self.list == ScheduleList::Plan && over == Some(ScheduleList::Result) {
                let Some(source) = plan.iter().find(|e| e.id == self.entry) else {
                    return DragOutcome::NoChange;
                };
                let mut entries = result.to_vec();
                match self.break_len.filter(|_| source.is_marker()) {
                    Some(len) => {
                        // A copied break keeps its length: both bounds land
                        // in the result list as bare-time markers.
                        entries.push(ScheduleEntry::marker(time::format_minutes(snapped)));
                        entries.push(ScheduleEntry::marker(time::format_minutes(snapped + len)));
                    }
                    None => {
                        entries.push(ScheduleEntry::new(
                            time::format_minutes(snapped),
                            source.project.clone(),
                            source.task.clone(),
                        ));
                    }
                }
                sort_entries(&mut entries);
                return DragOutcome::Copied { result: entries };
            }

            let source_list = match self.list {
                ScheduleList::Plan => plan,
                ScheduleList::Result => result,
            };
            if !source_list.iter().any(|e| e.id == self.entry) {
                return DragOutcome::NoChange;
            }
            let mut entries = source_list.to_vec();
            for entry in &mut entries {
                if entry.id == self.entry {
                    entry.time = time::format_minutes(snapped);
                }
            }
            sort_entries(&mut entries);
            DragOutcome::Moved {
                list: self.list,
                entries,
            }
        }
    }

}

pub use format::format_report;
pub use parser::{MarkdownReportParser, ReportParser, parse_report_from_str};
