use super::parser::{parse_line, ParsedLine};
use super::rule::{compile, CompiledRule};

/// Sequential rule identifier cursor shared by every source of one sync pass.
#[derive(Debug, Clone)]
pub struct RuleIdAllocator {
    next: u32,
}

impl RuleIdAllocator {
    pub fn new(start: u32) -> Self {
        Self { next: start }
    }

    /// The identifier the next successful allocation will receive.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Hands the next identifier to `build` and consumes it only if `build` returns `Some`.
    pub fn allocate_with<T>(&mut self, build: impl FnOnce(u32) -> Option<T>) -> Option<T> {
        let id = self.next;
        let next = id.checked_add(1)?;
        let value = build(id)?;
        self.next = next;
        Some(value)
    }

    /// Compiles `body` with the next identifier, consuming it on success.
    pub fn compile(&mut self, body: &str, is_allow: bool) -> Option<CompiledRule> {
        self.allocate_with(|id| compile(body, id, is_allow))
    }
}

/// Rules compiled from one list, allow rules first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledList {
    pub rules: Vec<CompiledRule>,
    pub next_id: u32,
}

/// Compiles a whole list starting at the allocator's current cursor.
///
/// Stops early once more than `ceiling` identifiers were consumed by this list.
pub fn compile_list(text: &str, ids: &mut RuleIdAllocator, ceiling: usize) -> CompiledList {
    let start = ids.peek();
    let mut allow_rules = Vec::new();
    let mut block_rules = Vec::new();

    for line in text.lines() {
        let compiled = match parse_line(line) {
            ParsedLine::Skip => continue,
            ParsedLine::AllowFilter(body) => ids.compile(body, true),
            ParsedLine::BlockFilter(body) => ids.compile(body, false),
        };
        let Some(rule) = compiled else {
            continue;
        };

        if rule.is_allow() {
            allow_rules.push(rule);
        } else {
            block_rules.push(rule);
        }

        if (ids.peek() - start) as usize > ceiling {
            break;
        }
    }

    allow_rules.append(&mut block_rules);
    CompiledList {
        rules: allow_rules,
        next_id: ids.peek(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RuleAction;

    #[test]
    fn test_failed_compilation_consumes_no_id() {
        let mut ids = RuleIdAllocator::new(10);
        assert!(ids.compile("example.com##.ad", false).is_none());
        assert_eq!(ids.peek(), 10);
        let rule = ids.compile("||ads.com^", false).unwrap();
        assert_eq!(rule.id, 10);
        assert_eq!(ids.peek(), 11);
    }

    #[test]
    fn test_allocator_exhaustion() {
        let mut ids = RuleIdAllocator::new(u32::MAX);
        assert!(ids.compile("||ads.com^", false).is_none());
        assert_eq!(ids.peek(), u32::MAX);
    }

    #[test]
    fn test_compile_list_orders_allow_first() {
        let text = "! Title: test\r\n[Adblock Plus 2.0]\n||ads.com^\n@@||good.com^\nexample.com##.ad\n\ntracker.net\n@@/ok/*\n";
        let mut ids = RuleIdAllocator::new(1000);
        let list = compile_list(text, &mut ids, 30_000);

        assert_eq!(list.rules.len(), 4);
        assert_eq!(list.next_id, 1004);
        let actions: Vec<_> = list.rules.iter().map(|r| r.action_type).collect();
        assert_eq!(
            actions,
            vec![RuleAction::Allow, RuleAction::Allow, RuleAction::Block, RuleAction::Block]
        );
        // Identifiers follow input order, not output order
        let ids: Vec<_> = list.rules.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1001, 1003, 1000, 1002]);
    }

    #[test]
    fn test_per_source_soft_cap() {
        let text: String = (0..50).map(|i| format!("||host{i}.com^\n")).collect();
        let mut ids = RuleIdAllocator::new(1);
        let list = compile_list(&text, &mut ids, 10);
        assert_eq!(list.rules.len(), 11);
        assert_eq!(list.next_id, 12);
    }

    #[test]
    fn test_shared_cursor_across_lists() {
        let mut ids = RuleIdAllocator::new(1000);
        let first = compile_list("||a.com^\n||b.com^", &mut ids, 100);
        let second = compile_list("||c.com^", &mut ids, 100);
        assert_eq!(first.next_id, 1002);
        assert_eq!(second.rules[0].id, 1002);
        assert_eq!(second.next_id, 1003);
    }
}
