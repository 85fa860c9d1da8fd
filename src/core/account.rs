//! Account name hierarchy helpers and posting classification rules.
//!
//! Accounts follow the usual plain-text accounting conventions: segments
//! joined by `:`, cash under `Assets:Checking`, realized gains under
//! `Income:CapitalGains:<source>` and interest under `Income:Interest`.

const CAPITAL_GAINS_PREFIX: &str = "Income:CapitalGains:";
const CAPITAL_GAINS_SOURCE_PREFIX: &str = "Assets:";
const INTEREST_PREFIX: &str = "Income:Interest";
const CHECKING_PREFIX: &str = "Assets:Checking";

/// True when `group` is the same account as `account` or one of its
/// hierarchical ancestors.
pub fn is_same_or_parent(account: &str, group: &str) -> bool {
    if group.is_empty() {
        return false;
    }
    account == group || account.starts_with(&format!("{group}:"))
}

/// All proper ancestor prefixes of an account, shortest first.
/// `"Assets:Equity:Stock"` yields `["Assets", "Assets:Equity"]`.
pub fn parents(account: &str) -> Vec<String> {
    let parts: Vec<&str> = account.split(':').collect();
    (1..parts.len()).map(|i| parts[..i].join(":")).collect()
}

pub fn is_checking(account: &str) -> bool {
    account.starts_with(CHECKING_PREFIX)
}

pub fn is_capital_gains(account: &str) -> bool {
    account.starts_with(CAPITAL_GAINS_PREFIX)
}

/// Asset account a capital-gains posting originated from.
/// `"Income:CapitalGains:Equity:NIFTY"` maps to `"Assets:Equity:NIFTY"`.
pub fn capital_gains_source(account: &str) -> String {
    account.replacen(CAPITAL_GAINS_PREFIX, CAPITAL_GAINS_SOURCE_PREFIX, 1)
}

/// Account used for group membership: capital-gains postings attribute to
/// their source asset account, everything else to its own account.
pub fn group_account(account: &str) -> String {
    if is_capital_gains(account) {
        capital_gains_source(account)
    } else {
        account.to_string()
    }
}

pub fn is_interest(account: &str) -> bool {
    account.starts_with(INTEREST_PREFIX)
}

/// SQL-LIKE style matching over account names: `%` matches any run of
/// characters, `_` matches exactly one. Mirrors the pattern dialect the
/// posting store queries with.
pub fn like_matches(pattern: &str, account: &str) -> bool {
    fn matches(p: &[char], a: &[char]) -> bool {
        match p.split_first() {
            None => a.is_empty(),
            Some(('%', rest)) => {
                (0..=a.len()).any(|skip| matches(rest, &a[skip..]))
            }
            Some(('_', rest)) => !a.is_empty() && matches(rest, &a[1..]),
            Some((c, rest)) => a.first() == Some(c) && matches(rest, &a[1..]),
        }
    }
    let p: Vec<char> = pattern.chars().collect();
    let a: Vec<char> = account.chars().collect();
    matches(&p, &a)
}
