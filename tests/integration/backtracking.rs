//! Termination directives, state propagation and fault delivery

use super::test_utils::{drain, full_order, path};
use powerset_walk::{
    callback, eager, validate_path, Decision, Directive, Enumeration, Fork, Path, PowersetError,
    ResumeLevel,
};

/// Run a callback traversal that emits each visited path and backtracks where `rule` says
fn visit_with(
    items: usize,
    rule: impl Fn(&Path) -> Option<ResumeLevel> + Send + 'static,
) -> Vec<Path> {
    drain(
        callback(items, (), move |path, _, state, emit| {
            emit.emit(path.clone())?;
            Ok(match rule(path) {
                Some(level) => Directive::Backtrack(level),
                None => Directive::Continue(state),
            })
        })
        .unwrap(),
    )
}

#[test]
fn test_partial_backtrack_resumes_at_root_sibling() {
    let target = path("1:+ 0:-");
    let visited = visit_with(3, move |p| {
        validate_path(p, &target).then_some(ResumeLevel::Depth(0))
    });

    let mut expected = full_order(3);
    expected.retain(|p| *p != path("2:- 1:+ 0:-") && *p != path("2:+ 1:+ 0:-"));
    assert_eq!(visited, expected);
    assert_eq!(visited.len(), 13);

    let stop = visited.iter().position(|p| *p == path("1:+ 0:-")).unwrap();
    assert_eq!(visited[stop + 1], path("0:+"));
}

#[test]
fn test_terminate_halts_everything() {
    let visited = visit_with(3, |p| (p.depth() == 3).then_some(ResumeLevel::BeforeRoot));
    assert_eq!(
        visited,
        vec![path("{}"), path("0:-"), path("1:- 0:-"), path("2:- 1:- 0:-")]
    );
}

#[test]
fn test_terminate_at_root() {
    let visited = visit_with(4, |_| Some(ResumeLevel::BeforeRoot));
    assert_eq!(visited, vec![Path::new()]);
}

#[test]
fn test_deep_stop_skips_intermediate_siblings() {
    // Stopping at depth 4 and resuming at depth 1 skips the unexplored
    // siblings at depths 2, 3 and 4, then runs depth 1's included branch.
    let stop = path("3:- 2:- 1:- 0:-");
    let visited = visit_with(4, move |p| (*p == stop).then_some(ResumeLevel::Depth(1)));

    let at = visited.iter().position(|p| *p == path("3:- 2:- 1:- 0:-")).unwrap();
    assert_eq!(visited[at + 1], path("1:+ 0:-"));
    for skipped in ["3:+ 2:- 1:- 0:-", "2:+ 1:- 0:-", "3:- 2:+ 1:- 0:-"] {
        assert!(!visited.contains(&path(skipped)), "{} should be skipped", skipped);
    }
    // Everything under the root's included branch still runs.
    let under_included_root = visited
        .iter()
        .filter(|p| p.iter().last() == Some(&Decision::included(0)))
        .count();
    assert_eq!(under_included_root, 15);
}

#[test]
fn test_one_step_backtracking_prunes_subtree_only() {
    let visited = visit_with(3, |p| {
        (p.first() == Some(&Decision::included(0)))
            .then(|| ResumeLevel::parent_of(p.depth()))
    });
    // The included branch of the root is entered once and abandoned.
    assert_eq!(visited.len(), 1 + 7 + 1);
    assert_eq!(visited.last(), Some(&path("0:+")));
}

#[derive(Debug, Clone, PartialEq)]
struct Trail {
    included: Vec<usize>,
}

impl Fork for Trail {
    fn fork(&self) -> Self {
        Trail {
            included: self.included.clone(),
        }
    }
}

#[test]
fn test_state_propagates_top_down_per_branch() {
    let trails = drain(
        callback(3, Trail { included: Vec::new() }, |path, is_leaf, mut state: Trail, emit| {
            if let Some(decision) = path.first() {
                if decision.included {
                    state.included.push(decision.index);
                }
            }
            if is_leaf {
                emit.emit(state.included.clone())?;
            }
            Ok(Directive::Continue(state))
        })
        .unwrap(),
    );

    // Root-first included indices equal the reversed variable-size output.
    let expected: Vec<Vec<usize>> = eager::variable_size(3)
        .unwrap()
        .into_iter()
        .map(|mut indices| {
            indices.reverse();
            indices
        })
        .collect();
    assert_eq!(trails, expected);
}

fn last_item<T: std::fmt::Debug>(enumeration: Enumeration<T>) -> (usize, PowersetError) {
    let items: Vec<_> = enumeration.collect();
    let count = items.len();
    match items.into_iter().last() {
        Some(Err(err)) => (count, err),
        other => panic!("expected a trailing fault, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_resume_level_is_a_fault() {
    let enumeration = callback(3, (), |path, _, state, emit| {
        emit.emit(path.depth())?;
        if path.depth() == 2 {
            return Ok(Directive::Backtrack(ResumeLevel::Depth(3)));
        }
        Ok(Directive::Continue(state))
    })
    .unwrap();

    let (count, err) = last_item(enumeration);
    assert_eq!(count, 4);
    assert!(matches!(
        err,
        PowersetError::InvalidResumeLevel {
            requested: ResumeLevel::Depth(3),
            depth: 2
        }
    ));
}

#[test]
fn test_decision_error_ends_stream() {
    let enumeration = callback(3, (), |path, _, state, emit| {
        if path.depth() == 3 {
            return Err(PowersetError::Decision(format!("refused {}", path)));
        }
        emit.emit(())?;
        Ok(Directive::Continue(state))
    })
    .unwrap();

    let (count, err) = last_item(enumeration);
    assert_eq!(count, 4);
    assert!(matches!(err, PowersetError::Decision(message) if message == "refused 2:- 1:- 0:-"));
}

#[test]
fn test_decision_panic_ends_stream() {
    let enumeration = callback(2, (), |path, _, state, emit| {
        if path.depth() == 1 {
            panic!("decision function exploded");
        }
        emit.emit(())?;
        Ok(Directive::Continue(state))
    })
    .unwrap();

    let canceller = enumeration.canceller();
    let (count, err) = last_item(enumeration);
    assert_eq!(count, 2);
    assert!(matches!(err, PowersetError::ProducerPanicked(message) if message.contains("exploded")));
    canceller.cancel();
}

#[test]
fn test_eager_callback_matches_lazy() {
    let rule = |p: &Path| {
        (p.depth() == 2 && p.first().is_some_and(|d| d.included)).then_some(ResumeLevel::Depth(0))
    };
    let lazy = visit_with(4, rule);
    let eager = eager::callback(4, (), move |path, _, state, emit| {
        emit.emit(path.clone())?;
        Ok(match rule(path) {
            Some(level) => Directive::Backtrack(level),
            None => Directive::Continue(state),
        })
    })
    .unwrap();
    assert_eq!(lazy, eager);
}
