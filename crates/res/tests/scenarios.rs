use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use tessera_res::{
    AssetKind, Atom, Project, PropTracker, Property, Ref, ResError, Status, TransactError,
    Tracker, TreeTracker,
};

struct Foo {
    x: Property<i32>,
}

impl AssetKind for Foo {
    const KIND: &'static str = "foo";
}

struct Link {
    to: Property<Ref<Foo>>,
}

impl AssetKind for Link {
    const KIND: &'static str = "link";
}

fn name(text: &str) -> Atom {
    Atom::parse(text).unwrap()
}

#[test]
fn create_edit_undo_redo() {
    let project = Project::new();
    let foo = project
        .run(|ts| {
            ts.describe("Create foo");
            project.create(ts, name("/foo"), Foo { x: Property::new(1) })
        })
        .unwrap();

    project
        .run(|ts| {
            ts.describe("Set x");
            foo.x.set(ts, 5);
            Ok::<_, ResError>(())
        })
        .unwrap();
    assert_eq!(project.nexus().undo_label(), "Undo: Set x");

    project.undo().unwrap();
    assert_eq!(foo.x.get(), 1);

    project.undo().unwrap();
    assert!(project.get_asset_names().is_empty());
    assert!(project.lookup(&name("/foo")).is_none());
    assert_eq!(project.undo().unwrap_err(), TransactError::NothingToUndo);

    project.redo().unwrap();
    project.redo().unwrap();
    let back = project.get::<Foo>(&name("/foo")).unwrap();
    assert_eq!(back, foo);
    assert_eq!(back.x.get(), 5);
    assert!(!project.nexus().has_redo());
}

#[test]
fn failed_run_rolls_back_completely() {
    let project = Project::new();
    let foo = project
        .run(|ts| project.create(ts, name("/foo"), Foo { x: Property::new(1) }))
        .unwrap();
    let depth = project.nexus().undo_depth();

    let result: Result<(), ResError> = project.run(|ts| {
        ts.describe("Move vertex");
        foo.x.set(ts, 99);
        project.create(ts, name("/bar"), Foo { x: Property::new(0) })?;
        Err(ResError::NotBound(name("/nowhere")))
    });

    assert!(result.is_err());
    assert_eq!(foo.x.get(), 1);
    assert!(project.lookup(&name("/bar")).is_none());
    assert_eq!(project.nexus().get_status(), Status::Ready);
    assert_eq!(project.nexus().undo_depth(), depth);
}

#[test]
fn panicking_run_rolls_back() {
    let project = Project::new();
    let foo = project
        .run(|ts| project.create(ts, name("/foo"), Foo { x: Property::new(1) }))
        .unwrap();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        project.run(|ts| -> Result<(), ResError> {
            foo.x.set(ts, 42);
            foo.destroy(ts)?;
            panic!("tool crashed");
        })
    }));

    assert!(outcome.is_err());
    assert_eq!(foo.x.get(), 1);
    assert!(foo.asset().is_alive());
    assert_eq!(project.nexus().get_status(), Status::Ready);
}

#[test]
fn reentrant_run_is_refused() {
    let project = Project::new();
    let inner = project
        .run(|_| Ok::<_, ResError>(project.run(|_| Ok::<_, TransactError>(()))))
        .unwrap();
    assert_eq!(inner.unwrap_err(), TransactError::Busy);

    let undo_inside = project
        .run(|_| Ok::<_, ResError>(project.undo()))
        .unwrap();
    assert_eq!(undo_inside.unwrap_err(), TransactError::Busy);
}

#[test]
fn new_transaction_discards_redo() {
    let project = Project::new();
    let foo = project
        .run(|ts| project.create(ts, name("/foo"), Foo { x: Property::new(0) }))
        .unwrap();
    for v in 1..=3 {
        project
            .run(|ts| {
                foo.x.set(ts, v);
                Ok::<_, ResError>(())
            })
            .unwrap();
    }
    project.undo().unwrap();
    project.undo().unwrap();
    assert_eq!(project.nexus().redo_depth(), 2);

    project
        .run(|ts| {
            foo.x.set(ts, 10);
            Ok::<_, ResError>(())
        })
        .unwrap();
    assert!(!project.nexus().has_redo());
    assert_eq!(project.redo().unwrap_err(), TransactError::NothingToRedo);

    project.undo().unwrap();
    assert_eq!(foo.x.get(), 1);
}

#[test]
fn trackers_survive_history_walks() {
    let project = Project::new();
    let single = Tracker::<Foo>::new(&project);
    let tree = TreeTracker::<Foo>::new(&project);
    single.set_name(name("/lvl/foo"));
    tree.set_base(name("/lvl"));

    let transitions = Rc::new(RefCell::new(Vec::new()));
    let _acq = {
        let t = Rc::clone(&transitions);
        single.on_acquire().subscribe(move |_| t.borrow_mut().push("acquire"))
    };
    let _lose = {
        let t = Rc::clone(&transitions);
        single.on_lose().subscribe(move |_| t.borrow_mut().push("lose"))
    };

    let foo = project
        .run(|ts| project.create(ts, name("/lvl/foo"), Foo { x: Property::new(0) }))
        .unwrap();
    project.run(|ts| foo.rename(ts, name("/lvl/bar"))).unwrap();
    assert!(single.get().is_none());
    assert_eq!(tree.len(), 1);

    project.undo().unwrap();
    assert_eq!(single.get(), Some(foo.clone()));
    project.undo().unwrap();
    assert!(tree.is_empty());
    project.redo().unwrap();
    project.redo().unwrap();
    assert_eq!(tree.get(), vec![foo]);

    assert_eq!(
        *transitions.borrow(),
        ["acquire", "lose", "acquire", "lose", "acquire", "lose"]
    );
}

#[test]
fn prop_tracker_retargets_through_undo() {
    let project = Project::new();
    let (a, b, link) = project
        .run(|ts| {
            let a = project.create(ts, name("/a"), Foo { x: Property::new(1) })?;
            let b = project.create(ts, name("/b"), Foo { x: Property::new(2) })?;
            let link = project.create(
                ts,
                name("/link"),
                Link {
                    to: Property::new(a.to_ref()),
                },
            )?;
            Ok::<_, ResError>((a, b, link))
        })
        .unwrap();

    let tracker = PropTracker::<Foo>::new(&project);
    tracker.bind(&link.to);
    let acquired = Rc::new(Cell::new(0));
    let _sub = {
        let acquired = Rc::clone(&acquired);
        tracker.on_acquire().subscribe(move |_| acquired.set(acquired.get() + 1))
    };

    project
        .run(|ts| {
            link.to.set(ts, b.to_ref());
            Ok::<_, ResError>(())
        })
        .unwrap();
    assert_eq!(tracker.get().map(|h| h.x.get()), Some(2));

    project.undo().unwrap();
    assert_eq!(tracker.get(), Some(a.clone()));

    project.run(|ts| a.destroy(ts)).unwrap();
    assert!(tracker.get().is_none());
    project.undo().unwrap();
    assert_eq!(tracker.get(), Some(a));
    assert_eq!(acquired.get(), 3);
}

#[test]
fn status_observers_see_busy_during_undo() {
    let project = Project::new();
    let foo = project
        .run(|ts| project.create(ts, name("/foo"), Foo { x: Property::new(0) }))
        .unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let _status = {
        let seen = Rc::clone(&seen);
        project
            .nexus()
            .on_status_change()
            .subscribe(move |s| seen.borrow_mut().push(*s))
    };
    let during = Rc::new(Cell::new(None));
    let _x = {
        let during = Rc::clone(&during);
        let nexus_project = project.clone();
        foo.x
            .on_change()
            .subscribe(move |_| during.set(Some(nexus_project.nexus().get_status())))
    };

    project
        .run(|ts| {
            foo.x.set(ts, 3);
            Ok::<_, ResError>(())
        })
        .unwrap();
    project.undo().unwrap();

    assert_eq!(during.get(), Some(Status::Busy));
    assert_eq!(
        *seen.borrow(),
        [Status::Busy, Status::Ready, Status::Busy, Status::Ready]
    );
}
