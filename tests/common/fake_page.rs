use std::collections::HashMap;

use job_assistant::agent::error::AgentError;
use job_assistant::browser::driver::{ElementHandle, PageDriver};

/// What clicking an element does to the fake browser.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ClickEffect {
    #[default]
    Nothing,
    /// Load another scripted page (by index); all handles go stale.
    GoTo(usize),
}

/// A scripted DOM element.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub visible: bool,
    pub options: Vec<String>,
    pub on_click: ClickEffect,
    pub click_fails: bool,
    pub unreadable: bool,
}

impl FakeElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            visible: true,
            ..Default::default()
        }
    }

    pub fn input(input_type: &str, id: &str, name: &str) -> Self {
        Self::new("input")
            .attr("type", input_type)
            .attr("id", id)
            .attr("name", name)
    }

    pub fn textarea(id: &str, name: &str) -> Self {
        Self::new("textarea").attr("id", id).attr("name", name)
    }

    pub fn select(id: &str, name: &str, options: &[&str]) -> Self {
        let mut el = Self::new("select").attr("id", id).attr("name", name);
        el.options = options.iter().map(|o| o.to_string()).collect();
        el
    }

    pub fn label(for_id: &str, text: &str) -> Self {
        Self::new("label").attr("for", for_id).text(text)
    }

    pub fn button(text: &str) -> Self {
        Self::new("button").text(text)
    }

    pub fn link(text: &str) -> Self {
        Self::new("a").attr("href", "#").text(text)
    }

    pub fn submit_input(value: &str) -> Self {
        Self::new("input").attr("type", "submit").attr("value", value)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn navigates_to(mut self, page: usize) -> Self {
        self.on_click = ClickEffect::GoTo(page);
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.click_fails = true;
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }
}

/// In-memory `PageDriver` over a list of scripted pages. Navigation loads
/// page 0. Records every interaction for assertions.
#[derive(Debug, Default)]
pub struct FakePage {
    pub pages: Vec<Vec<FakeElement>>,
    pub current: usize,
    generation: usize,
    /// Typed text per (page, element index)
    pub values: HashMap<(usize, usize), String>,
    /// Selected option text per (page, element index)
    pub selected: HashMap<(usize, usize), String>,
    /// Text of every successfully clicked element, in order
    pub clicks: Vec<String>,
    pub settles: Vec<u64>,
    pub navigations: Vec<String>,
    pub fail_navigation: bool,
}

enum Target {
    Element(usize),
    Option(usize, usize),
}

impl FakePage {
    pub fn new(pages: Vec<Vec<FakeElement>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn single(elements: Vec<FakeElement>) -> Self {
        Self::new(vec![elements])
    }

    /// Pre-fill a control (by id) on a page, as if the site had a default.
    pub fn prefill(&mut self, page: usize, id: &str, value: &str) {
        let index = self.index_of(page, id).expect("no element with that id");
        self.values.insert((page, index), value.to_string());
    }

    pub fn value_of(&self, page: usize, id: &str) -> Option<&str> {
        let index = self.index_of(page, id)?;
        self.values.get(&(page, index)).map(String::as_str)
    }

    pub fn selected_of(&self, page: usize, id: &str) -> Option<&str> {
        let index = self.index_of(page, id)?;
        self.selected.get(&(page, index)).map(String::as_str)
    }

    fn index_of(&self, page: usize, id: &str) -> Option<usize> {
        self.pages
            .get(page)?
            .iter()
            .position(|el| el.attrs.get("id").map(String::as_str) == Some(id))
    }

    fn elements(&self) -> &[FakeElement] {
        self.pages.get(self.current).map(Vec::as_slice).unwrap_or(&[])
    }

    fn handle(&self, target: Target) -> ElementHandle {
        match target {
            Target::Element(i) => ElementHandle(format!("g{}:e{}", self.generation, i)),
            Target::Option(i, o) => ElementHandle(format!("g{}:e{}:o{}", self.generation, i, o)),
        }
    }

    fn resolve(&self, handle: &ElementHandle) -> Result<Target, AgentError> {
        let stale = || AgentError::SessionProtocol {
            command: "resolve".into(),
            error: format!("stale element handle {}", handle),
        };

        let mut parts = handle.0.split(':');
        let generation: usize = parts
            .next()
            .and_then(|g| g.strip_prefix('g'))
            .and_then(|g| g.parse().ok())
            .ok_or_else(stale)?;
        if generation != self.generation {
            return Err(stale());
        }

        let element: usize = parts
            .next()
            .and_then(|e| e.strip_prefix('e'))
            .and_then(|e| e.parse().ok())
            .ok_or_else(stale)?;
        if element >= self.elements().len() {
            return Err(stale());
        }

        match parts.next() {
            Some(o) => {
                let option: usize = o
                    .strip_prefix('o')
                    .and_then(|o| o.parse().ok())
                    .ok_or_else(stale)?;
                Ok(Target::Option(element, option))
            }
            None => Ok(Target::Element(element)),
        }
    }

    fn element(&self, handle: &ElementHandle) -> Result<(usize, &FakeElement), AgentError> {
        match self.resolve(handle)? {
            Target::Element(i) => {
                let el = &self.elements()[i];
                if el.unreadable {
                    return Err(AgentError::SessionProtocol {
                        command: "read".into(),
                        error: format!("element {} detached", handle),
                    });
                }
                Ok((i, el))
            }
            Target::Option(..) => Err(AgentError::SessionProtocol {
                command: "read".into(),
                error: "option handle used as element".into(),
            }),
        }
    }
}

/// `tag` or `tag[attr='value']`, with CSS backslash escapes in the value.
fn matches_selector(el: &FakeElement, selector: &str) -> bool {
    let (tag, condition) = match selector.split_once('[') {
        Some((tag, rest)) => (tag, Some(rest.trim_end_matches(']'))),
        None => (selector, None),
    };
    if el.tag != tag {
        return false;
    }

    let Some(condition) = condition else {
        return true;
    };
    let Some((attr, quoted)) = condition.split_once('=') else {
        return el.attrs.contains_key(condition);
    };

    let quoted = quoted.trim_matches('\'').trim_matches('"');
    let mut expected = String::new();
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                expected.push(next);
            }
        } else {
            expected.push(c);
        }
    }

    el.attrs.get(attr).map(String::as_str) == Some(expected.as_str())
}

impl PageDriver for FakePage {
    fn navigate(&mut self, url: &str) -> Result<(), AgentError> {
        if self.fail_navigation {
            return Err(AgentError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".into(),
            });
        }
        self.navigations.push(url.to_string());
        self.current = 0;
        self.generation += 1;
        Ok(())
    }

    fn settle(&mut self, ms: u64) -> Result<(), AgentError> {
        self.settles.push(ms);
        Ok(())
    }

    fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>, AgentError> {
        let matching: Vec<usize> = self
            .elements()
            .iter()
            .enumerate()
            .filter(|(_, el)| matches_selector(el, selector))
            .map(|(i, _)| i)
            .collect();
        Ok(matching
            .into_iter()
            .map(|i| self.handle(Target::Element(i)))
            .collect())
    }

    fn find_within(
        &mut self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, AgentError> {
        let (index, el) = self.element(parent)?;
        if selector != "option" {
            return Ok(Vec::new());
        }
        let count = el.options.len();
        Ok((0..count)
            .map(|o| self.handle(Target::Option(index, o)))
            .collect())
    }

    fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, AgentError> {
        let (_, el) = self.element(element)?;
        Ok(el.attrs.get(name).cloned())
    }

    fn text(&mut self, element: &ElementHandle) -> Result<String, AgentError> {
        match self.resolve(element)? {
            Target::Option(i, o) => Ok(self.elements()[i]
                .options
                .get(o)
                .cloned()
                .unwrap_or_default()),
            Target::Element(_) => Ok(self.element(element)?.1.text.clone()),
        }
    }

    fn is_visible(&mut self, element: &ElementHandle) -> Result<bool, AgentError> {
        Ok(self.element(element)?.1.visible)
    }

    fn clear(&mut self, element: &ElementHandle) -> Result<(), AgentError> {
        let (index, _) = self.element(element)?;
        self.values.insert((self.current, index), String::new());
        Ok(())
    }

    fn type_text(&mut self, element: &ElementHandle, text: &str) -> Result<(), AgentError> {
        let (index, _) = self.element(element)?;
        self.values
            .entry((self.current, index))
            .or_default()
            .push_str(text);
        Ok(())
    }

    fn select_by_visible_text(
        &mut self,
        element: &ElementHandle,
        text: &str,
    ) -> Result<(), AgentError> {
        let (index, el) = self.element(element)?;
        if !el.options.iter().any(|o| o == text) {
            return Err(AgentError::SessionProtocol {
                command: "select".into(),
                error: format!("no option with visible text \"{}\"", text),
            });
        }
        self.selected.insert((self.current, index), text.to_string());
        Ok(())
    }

    fn click(&mut self, element: &ElementHandle) -> Result<(), AgentError> {
        let (_, el) = self.element(element)?;
        if el.click_fails {
            return Err(AgentError::SessionProtocol {
                command: "click".into(),
                error: "element is not clickable: another element would receive the click".into(),
            });
        }

        let label = if el.text.is_empty() {
            el.attrs.get("value").cloned().unwrap_or_default()
        } else {
            el.text.clone()
        };
        let effect = el.on_click.clone();

        self.clicks.push(label);
        if let ClickEffect::GoTo(page) = effect {
            self.current = page;
            self.generation += 1;
        }
        Ok(())
    }
}
