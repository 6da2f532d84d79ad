use serde::{Deserialize, Serialize};

use crate::ast::{Expr, JoinKind, LogicalOp};
use crate::fingerprint::{self, Fingerprint};

/// One link of a join's ON-condition chain.
///
/// Each link stores its local structural hash and the cumulative hash of the
/// chain up to and including itself, so the chain fingerprint never needs a
/// re-walk as conditions accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinCond {
    pub expr: Expr,
    pub op: LogicalOp,
    #[serde(skip)]
    fp: u64,
    #[serde(skip)]
    acc: u64,
}

impl JoinCond {
    /// Local structural hash of this condition.
    pub fn local_hash(&self) -> u64 {
        self.fp
    }

    /// Cumulative chain hash up to and including this condition.
    pub fn cumulative_hash(&self) -> u64 {
        self.acc
    }
}

/// An ordered ON-condition chain with an incrementally maintained
/// cumulative hash. Reading the chain fingerprint is O(1).
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct JoinCondChain {
    nodes: Vec<JoinCond>,
}

impl JoinCondChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition, folding its hash into the running chain hash.
    pub fn push(&mut self, expr: Expr, op: LogicalOp) {
        let fp = cond_hash(&expr, op);
        let prev = self
            .nodes
            .last()
            .map(|n| n.acc)
            .unwrap_or(fingerprint::FNV_OFFSET_BASIS);
        let acc = fingerprint::mix_u64(prev, fp);
        self.nodes.push(JoinCond { expr, op, fp, acc });
    }

    /// The chain fingerprint, read from the last link.
    pub fn fingerprint(&self) -> u64 {
        self.nodes
            .last()
            .map(|n| n.acc)
            .unwrap_or(fingerprint::FNV_OFFSET_BASIS)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JoinCond> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// The per-link hashes are derived state; rebuild them instead of trusting
// serialized input.
impl<'de> Deserialize<'de> for JoinCondChain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Link {
            expr: Expr,
            op: LogicalOp,
        }
        #[derive(Deserialize)]
        struct Repr {
            nodes: Vec<Link>,
        }
        let repr = Repr::deserialize(deserializer)?;
        let mut chain = JoinCondChain::new();
        for link in repr.nodes {
            chain.push(link.expr, link.op);
        }
        Ok(chain)
    }
}

fn cond_hash(expr: &Expr, op: LogicalOp) -> u64 {
    let h = fingerprint::mix_u64(fingerprint::FNV_OFFSET_BASIS, fingerprint::kind::JOIN_COND);
    let h = fingerprint::mix_u64(h, op as u64);
    fingerprint::mix_u64(h, expr.fingerprint())
}

/// A join definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub conditions: JoinCondChain,
}

impl JoinClause {
    pub fn new(kind: JoinKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            alias: None,
            conditions: JoinCondChain::new(),
        }
    }

    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Append an ON condition joined with AND.
    pub fn on(mut self, expr: Expr) -> Self {
        self.conditions.push(expr, LogicalOp::And);
        self
    }

    /// Append an ON condition joined with OR.
    pub fn or_on(mut self, expr: Expr) -> Self {
        self.conditions.push(expr, LogicalOp::Or);
        self
    }
}
