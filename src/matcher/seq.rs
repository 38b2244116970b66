//! Sequence fields: fixed-arity prefixes and statement lists with clutter

use tracing::trace;

use super::state::{Bound, State};
use super::{Cont, Matcher};
use crate::node::{Node, Placeholder};
use crate::normalize::{merge_declaration, split_declaration};
use crate::utils::unwrap_or;

/// A place in the depth-first order of a statement list
#[derive(Clone, Copy)]
struct Pos<'a> {
  list: &'a [Node],
  idx: usize,
}

/// Every position of the list in depth-first source order. With `dive`, each
/// member is followed by the positions of its nested statement lists.
fn positions(list: &[Node], dive: bool) -> Vec<Pos<'_>> {
  fn push<'a>(list: &'a [Node], idx: usize, dive: bool, out: &mut Vec<Pos<'a>>) {
    out.push(Pos { list, idx });
    if dive {
      for nested in list[idx].nested_lists() {
        (0..nested.len()).for_each(|i| push(nested, i, dive, out));
      }
    }
  }
  let mut out = Vec::new();
  (0..list.len()).for_each(|idx| push(list, idx, dive, &mut out));
  out
}

/// Called with the number of pattern and candidate elements a match at some
/// position consumed
type Consumed<'k, 'a> = &'k mut dyn FnMut(usize, usize, State<'a>) -> bool;

impl<'m> Matcher<'m> {
  /// Element-wise from the front. Candidates beyond the pattern are ignored,
  /// a glob takes the shortest run that lets the rest match, or everything if
  /// it is last.
  pub(super) fn fixed<'a>(&self, ps: &[Node], cs: &'a [Node], st: State<'a>, k: Cont<'_, 'a>) -> bool {
    let (head, tail) = unwrap_or!(ps.split_first(); return k(st));
    if let Some(ph) = head.glob() {
      if tail.is_empty() {
        return self.bind(ph, Bound::Nodes(cs), st, k);
      }
      return (0..=cs.len()).any(|j| {
        let mut rest = |st| self.fixed(tail, &cs[j..], st, &mut *k);
        self.bind(ph, Bound::Nodes(&cs[..j]), st.clone(), &mut rest)
      });
    }
    let (first, others) = unwrap_or!(cs.split_first(); return false);
    self.node(head, first, st, &mut |st| self.fixed(tail, others, st, &mut *k))
  }

  /// Ordered subsequence. Each pattern element is looked for at every
  /// position after the previous match; the positions skipped over are
  /// clutter. With `dive`, positions include nested statement lists, and a
  /// match inside one confines the rest of the pattern to the remainder of
  /// that list.
  pub(super) fn scan<'a>(&self, ps: &[Node], cs: &'a [Node], dive: bool, st: State<'a>, k: Cont<'_, 'a>) -> bool {
    let head = unwrap_or!(ps.first(); return k(st));
    if let Some(ph) = head.glob() {
      return self.glob_gap(ph, ps, cs, dive, st, k);
    }
    let mut rest = |pos: Pos<'a>, np: usize, nc: usize, st: State<'a>| {
      self.scan(&ps[np..], &pos.list[pos.idx + nc..], dive, st, &mut *k)
    };
    let positions = positions(cs, dive);
    if self.order_matters {
      let chosen = positions.iter().find(|pos| self.at(ps, **pos, dive, st.clone(), &mut |_, _, _| true));
      let pos = *unwrap_or!(chosen; return false);
      trace!(idx = pos.idx, "committed to the first match");
      return self.at(ps, pos, dive, st, &mut |np, nc, st| rest(pos, np, nc, st));
    }
    positions.into_iter().any(|pos| self.at(ps, pos, dive, st.clone(), &mut |np, nc, st| rest(pos, np, nc, st)))
  }

  /// Match the head of the pattern at one position. Besides the plain
  /// comparison, statement lists try the declaration split in both
  /// directions if the rules allow it.
  fn at<'a>(&self, ps: &[Node], pos: Pos<'a>, dive: bool, mut st: State<'a>, k: Consumed<'_, 'a>) -> bool {
    let Pos { list, idx } = pos;
    st.root.get_or_insert(&list[idx]);
    let head = &ps[0];
    if self.node(head, &list[idx], st.clone(), &mut |st| k(1, 1, st)) {
      return true;
    }
    if !dive || !self.rules.is_some_and(|r| r.declaration_split) {
      return false;
    }
    if let (Some((decl, assign)), Some(next)) = (split_declaration(head), list.get(idx + 1)) {
      let mut then = |st| self.node(&assign, next, st, &mut |st| k(1, 2, st));
      if self.node(&decl, &list[idx], st.clone(), &mut then) {
        return true;
      }
    }
    match ps.get(1).and_then(|second| merge_declaration(head, second)) {
      Some(merged) => self.node(&merged, &list[idx], st, &mut |st| k(2, 1, st)),
      None => false,
    }
  }

  /// A glob among statements takes a contiguous run of the current list. The
  /// element after it has to match right where the run ends.
  fn glob_gap<'a>(
    &self,
    ph: &Placeholder,
    ps: &[Node],
    cs: &'a [Node],
    dive: bool,
    st: State<'a>,
    k: Cont<'_, 'a>,
  ) -> bool {
    let tail = &ps[1..];
    if tail.is_empty() {
      let mut st = st;
      st.root = st.root.or(cs.first());
      return self.bind(ph, Bound::Nodes(cs), st, k);
    }
    (0..cs.len()).any(|j| {
      let mut st = st.clone();
      if j > 0 {
        st.root.get_or_insert(&cs[0]);
      }
      let pos = Pos { list: cs, idx: j };
      let mut anchored = |st| {
        let mut rest = |np: usize, nc: usize, st| self.scan(&tail[np..], &cs[j + nc..], dive, st, &mut *k);
        self.at(tail, pos, dive, st, &mut rest)
      };
      self.bind(ph, Bound::Nodes(&cs[..j]), st, &mut anchored)
    })
  }
}
