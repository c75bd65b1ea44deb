//! The tiny Horn-clause term language the selector/policy/reachability
//! compilers emit into, and the evaluator consumes. Kept as an algebraic
//! variant type (rather than ad-hoc closures) so the evaluator, the
//! stratifier and tests can all pattern-match over it uniformly.

/// A rule-local variable, identified by position. Scoped to a single rule;
/// two literals using `Var(0)` in the same rule body refer to the same
/// logic variable.
pub type VarId = usize;

/// A positional value: the column of a previous relation, or the column of
/// this program's own derived relation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Var(VarId),
    Const(u32),
}

impl Term {
    pub fn var(id: VarId) -> Self {
        Term::Var(id)
    }

    pub fn konst(v: u32) -> Self {
        Term::Const(v)
    }
}

/// A single body literal. `NotEqual` encodes the `v₀ ≠ v₁` constraints used
/// by `user_crosscheck` and needs no relation lookup.
#[derive(Clone, Debug)]
pub enum Literal {
    Pos(String, Vec<Term>),
    Neg(String, Vec<Term>),
    NotEqual(Term, Term),
}

impl Literal {
    pub fn pos(relation: impl Into<String>, args: impl Into<Vec<Term>>) -> Self {
        Literal::Pos(relation.into(), args.into())
    }

    pub fn neg(relation: impl Into<String>, args: impl Into<Vec<Term>>) -> Self {
        Literal::Neg(relation.into(), args.into())
    }
}

/// One Horn clause: `head :- body`. A fact is a rule with an empty body.
#[derive(Clone, Debug)]
pub struct Rule {
    pub head: (String, Vec<Term>),
    pub body: Vec<Literal>,
}

impl Rule {
    pub fn fact(relation: impl Into<String>, args: impl Into<Vec<Term>>) -> Self {
        Rule {
            head: (relation.into(), args.into()),
            body: vec![],
        }
    }

    pub fn rule(relation: impl Into<String>, args: impl Into<Vec<Term>>, body: Vec<Literal>) -> Self {
        Rule {
            head: (relation.into(), args.into()),
            body,
        }
    }
}

/// A concrete, fully-ground tuple stored as a relation's fact.
pub type Tuple = Vec<u32>;
