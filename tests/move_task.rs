mod common;

#[cfg(test)]
mod tests {
    use crate::common::{member_ids, task, BoardContext, MEMBER, OUTSIDER};
    use boardsync::db::containers::Containers;
    use boardsync::db::db::Db;
    use boardsync::db::tasks::Tasks;
    use boardsync::libs::container::ContainerRef;
    use boardsync::libs::error::{ErrorKind, MoveError};
    use boardsync::libs::move_task::{execute_move, MoveRequest, MoveSettings};
    use boardsync::libs::position::DEFAULT_STEP;
    use std::thread;
    use test_context::test_context;

    fn to_column(task_id: i64, column_id: i64, position: Option<i64>) -> MoveRequest {
        MoveRequest {
            task_id,
            target_column_id: Some(column_id),
            position,
            ..MoveRequest::default()
        }
    }

    fn run(ctx: &mut BoardContext, request: &MoveRequest) -> Result<boardsync::libs::move_task::MoveOutcome, MoveError> {
        execute_move(&mut ctx.db.conn, MEMBER, request, &MoveSettings::default())
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_move_into_full_column_is_rejected(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        let before = task(&ctx.db.conn, f.a);

        let err = run(ctx, &to_column(f.a, f.doing, None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert!(err.to_string().contains('2'));

        let body = err.to_body();
        let details = body.details.unwrap();
        assert_eq!(details.code, "capacity_exceeded");
        assert_eq!(details.limit, Some(2));
        assert_eq!(details.count, Some(2));

        // Nothing was written.
        assert_eq!(task(&ctx.db.conn, f.a), before);
        assert_eq!(member_ids(&ctx.db.conn, &f.column(f.doing)), vec![f.d, f.e]);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_reorder_inside_a_full_column_is_allowed(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();

        let outcome = run(ctx, &to_column(f.e, f.doing, Some(0))).unwrap();
        assert_eq!(outcome.previous, f.column(f.doing));
        assert_eq!(member_ids(&ctx.db.conn, &f.column(f.doing)), vec![f.e, f.d]);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_move_into_column_with_room(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        Containers::new(&ctx.db.conn).set_column_limit(f.doing, Some(3)).unwrap();

        let outcome = run(ctx, &to_column(f.a, f.doing, Some(1))).unwrap();
        assert_eq!(outcome.task.column_id, Some(f.doing));
        assert_eq!(outcome.previous, f.column(f.todo));
        assert_eq!(member_ids(&ctx.db.conn, &f.column(f.doing)), vec![f.d, f.a, f.e]);
        assert_eq!(member_ids(&ctx.db.conn, &f.column(f.todo)), vec![f.b, f.c]);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_reorder_to_middle_persists(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();

        // [a, b, c]: c dropped at index 1 among [a, b].
        let outcome = run(ctx, &to_column(f.c, f.todo, Some(1))).unwrap();
        assert_eq!(outcome.task.position, 1.5 * DEFAULT_STEP);
        assert!(outcome.renumbered.is_empty());

        let reopened = Db::open(&ctx.path).unwrap();
        assert_eq!(member_ids(&reopened.conn, &f.column(f.todo)), vec![f.a, f.c, f.b]);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_resent_move_keeps_its_position(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        let request = to_column(f.c, f.todo, Some(1));

        let first = run(ctx, &request).unwrap();
        let second = run(ctx, &request).unwrap();

        assert_eq!(first.task.position, second.task.position);
        assert_eq!(member_ids(&ctx.db.conn, &f.column(f.todo)), vec![f.a, f.c, f.b]);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_exhausted_gap_renumbers_the_container(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        Tasks::new(&ctx.db.conn)
            .update_positions(&[(f.a, 1.0), (f.b, 1.0), (f.c, 1.0)])
            .unwrap();

        // c between a and b, whose positions are equal.
        let outcome = run(ctx, &to_column(f.c, f.todo, Some(1))).unwrap();
        let renumbered: Vec<(i64, f64)> = outcome.renumbered.iter().map(|sibling| (sibling.task_id, sibling.position)).collect();
        assert_eq!(renumbered, vec![(f.a, DEFAULT_STEP), (f.b, 2.0 * DEFAULT_STEP)]);
        assert_eq!(outcome.response().renumbered, outcome.renumbered);

        let members = Tasks::new(&ctx.db.conn).members(&f.column(f.todo)).unwrap();
        assert_eq!(members.iter().map(|task| task.id).collect::<Vec<_>>(), vec![f.a, f.c, f.b]);
        assert!(members.windows(2).all(|pair| pair[0].position < pair[1].position));
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_index_past_the_end_appends(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();

        run(ctx, &to_column(f.a, f.done, Some(99))).unwrap();
        assert_eq!(member_ids(&ctx.db.conn, &f.column(f.done)), vec![f.f, f.a]);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_nesting_under_own_descendant_is_rejected(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        // b becomes a child of a.
        let nest = MoveRequest {
            parent_id: Some(Some(f.a)),
            ..to_column(f.b, f.todo, Some(1))
        };
        run(ctx, &nest).unwrap();
        assert_eq!(task(&ctx.db.conn, f.b).parent_id, Some(f.a));

        // a under b would close the loop.
        let cycle = MoveRequest {
            parent_id: Some(Some(f.b)),
            ..to_column(f.a, f.todo, Some(0))
        };
        let err = run(ctx, &cycle).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CycleDetected);
        assert_eq!(err.to_string(), "Circular parent relationship detected");
        assert_eq!(task(&ctx.db.conn, f.a).parent_id, None);

        let self_nest = MoveRequest {
            parent_id: Some(Some(f.c)),
            ..to_column(f.c, f.todo, None)
        };
        assert_eq!(run(ctx, &self_nest).unwrap_err().kind(), ErrorKind::CycleDetected);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_parent_absent_keeps_and_null_clears(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        run(
            ctx,
            &MoveRequest {
                parent_id: Some(Some(f.a)),
                ..to_column(f.b, f.todo, None)
            },
        )
        .unwrap();

        // Moving without parentId keeps the link.
        let kept = run(ctx, &to_column(f.b, f.done, None)).unwrap();
        assert_eq!(kept.task.parent_id, Some(f.a));

        let cleared = MoveRequest::parse(format!(r#"{{"taskId": {}, "targetColumnId": {}, "parentId": null}}"#, f.b, f.done).as_bytes()).unwrap();
        let outcome = run(ctx, &cleared).unwrap();
        assert_eq!(outcome.task.parent_id, None);
        assert_eq!(outcome.task.column_id, Some(f.done));
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_non_member_is_forbidden(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        let err = execute_move(&mut ctx.db.conn, OUTSIDER, &to_column(f.a, f.done, None), &MoveSettings::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(task(&ctx.db.conn, f.a).column_id, Some(f.todo));
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_unknown_ids_are_not_found(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();

        let missing_task = run(ctx, &to_column(9_999, f.done, None)).unwrap_err();
        assert_eq!(missing_task.kind(), ErrorKind::NotFound);
        assert_eq!(missing_task.to_string(), "Task 9999 not found");

        let missing_column = run(ctx, &to_column(f.a, 9_999, None)).unwrap_err();
        assert_eq!(missing_column.kind(), ErrorKind::NotFound);

        let missing_parent = MoveRequest {
            parent_id: Some(Some(9_999)),
            ..to_column(f.a, f.todo, None)
        };
        assert_eq!(run(ctx, &missing_parent).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_targets_on_another_board_are_invalid(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();

        let column = run(ctx, &to_column(f.a, f.other_column, None)).unwrap_err();
        assert_eq!(column.kind(), ErrorKind::Validation);

        let sprint = MoveRequest {
            task_id: f.a,
            target_sprint_id: Some(f.other_sprint),
            ..MoveRequest::default()
        };
        assert_eq!(run(ctx, &sprint).unwrap_err().kind(), ErrorKind::Validation);

        let parent = MoveRequest {
            parent_id: Some(Some(f.x)),
            ..to_column(f.a, f.todo, None)
        };
        assert_eq!(run(ctx, &parent).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_sprint_column_must_match_sprint(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        let request = MoveRequest {
            task_id: f.a,
            target_sprint_column_id: Some(f.sprint_todo),
            target_sprint_id: Some(f.other_sprint),
            ..MoveRequest::default()
        };

        let err = run(ctx, &request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(task(&ctx.db.conn, f.a).column_id, Some(f.todo));
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_sprint_targets(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();

        let into_column = MoveRequest {
            task_id: f.a,
            target_sprint_column_id: Some(f.sprint_todo),
            ..MoveRequest::default()
        };
        let outcome = run(ctx, &into_column).unwrap();
        assert_eq!(outcome.task.container(), f.sprint_column(f.sprint_todo));
        assert_eq!(outcome.task.column_id, None);
        assert_eq!(outcome.task.sprint_id, Some(f.sprint));

        let into_backlog = MoveRequest {
            task_id: f.b,
            target_sprint_id: Some(f.sprint),
            ..MoveRequest::default()
        };
        let outcome = run(ctx, &into_backlog).unwrap();
        assert_eq!(outcome.task.container(), ContainerRef::SprintBacklog { sprint_id: f.sprint });
        assert_eq!(outcome.task.sprint_column_id, None);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_sprint_column_limit(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        let into = |task_id| MoveRequest {
            task_id,
            target_sprint_column_id: Some(f.sprint_doing),
            target_sprint_id: Some(f.sprint),
            ..MoveRequest::default()
        };

        run(ctx, &into(f.a)).unwrap();
        let err = run(ctx, &into(f.b)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert!(err.to_string().contains('1'));
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_no_target_means_board_backlog(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        let request = MoveRequest {
            task_id: f.d,
            position: Some(0),
            ..MoveRequest::default()
        };

        let outcome = run(ctx, &request).unwrap();
        assert_eq!(outcome.task.container(), ContainerRef::Backlog { board_id: f.board_id });
        assert_eq!(member_ids(&ctx.db.conn, &ContainerRef::Backlog { board_id: f.board_id }), vec![f.d, f.g]);
        assert_eq!(member_ids(&ctx.db.conn, &f.column(f.doing)), vec![f.e]);
    }

    #[test_context(BoardContext)]
    #[test]
    fn test_concurrent_moves_respect_the_limit(ctx: &mut BoardContext) {
        let f = ctx.fixture.clone();
        Containers::new(&ctx.db.conn).set_column_limit(f.doing, Some(3)).unwrap();

        let handles: Vec<_> = [f.a, f.b]
            .into_iter()
            .map(|task_id| {
                let path = ctx.path.clone();
                let doing = f.doing;
                thread::spawn(move || {
                    let mut conn = Db::connect(&path).unwrap();
                    execute_move(&mut conn, MEMBER, &to_column(task_id, doing, None), &MoveSettings::default())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        let rejected = results.iter().find_map(|result| result.as_ref().err()).unwrap();
        assert_eq!(rejected.kind(), ErrorKind::CapacityExceeded);

        assert_eq!(member_ids(&ctx.db.conn, &f.column(f.doing)).len(), 3);
    }
}
