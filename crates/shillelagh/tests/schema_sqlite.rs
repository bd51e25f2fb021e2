use shillelagh::prelude::*;
use shillelagh::{Row, create_table_sql, drop_table_sql};
use shillelagh_sqlite::SqliteConnection;

#[derive(Model, Debug, Default)]
#[shillelagh(table = "people")]
struct Person {
    #[shillelagh(id)]
    id: Option<i64>,
    name: String,
    age: i32,
    #[shillelagh(skip)]
    cached_greeting: String,
}

#[derive(Model, Debug, Default)]
#[shillelagh(table)]
struct TreeNode {
    #[shillelagh(id)]
    id: Option<i64>,
    label: String,
    #[shillelagh(foreign_key)]
    parent: Option<i64>,
    #[shillelagh(one_to_many, foreign_key = "parent")]
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    fn with_children(label: &str, children: Vec<TreeNode>) -> Self {
        Self {
            label: label.to_string(),
            children,
            ..Self::default()
        }
    }
}

#[derive(Model, Debug, Default)]
#[shillelagh(table)]
struct Album {
    #[shillelagh(id)]
    id: Option<i64>,
    title: String,
    #[shillelagh(one_to_many, foreign_key = "album_id")]
    tracks: Vec<Track>,
}

#[derive(Model, Debug, Default)]
#[shillelagh(table)]
struct Track {
    #[shillelagh(id)]
    id: Option<i64>,
    title: String,
    #[shillelagh(foreign_key)]
    album_id: Option<i64>,
}

#[derive(Model, Debug, Default)]
#[shillelagh(table)]
struct LinkedNode {
    #[shillelagh(id)]
    id: Option<i64>,
    label: String,
    #[shillelagh(one_to_one)]
    next: Option<Box<LinkedNode>>,
}

impl LinkedNode {
    fn chain(labels: &[&str]) -> Option<Box<Self>> {
        labels.iter().rev().fold(None, |next, label| {
            Some(Box::new(Self {
                id: None,
                label: (*label).to_string(),
                next,
            }))
        })
    }
}

#[derive(Model, Debug, Default)]
#[shillelagh(table)]
struct Husband {
    #[shillelagh(id)]
    id: Option<i64>,
    name: String,
    #[shillelagh(one_to_one)]
    spouse: Option<Box<Wife>>,
}

#[derive(Model, Debug, Default)]
#[shillelagh(table)]
struct Wife {
    #[shillelagh(id)]
    id: Option<i64>,
    name: String,
    #[shillelagh(one_to_one)]
    spouse: Option<Box<Husband>>,
}

#[derive(Model, Debug)]
#[shillelagh(table, orm_only = "Draft::blank")]
struct Draft {
    #[shillelagh(id)]
    id: Option<i64>,
    title: String,
}

impl Draft {
    fn blank() -> Self {
        Self {
            id: None,
            title: "untitled".to_string(),
        }
    }
}

fn memory() -> SqliteConnection {
    SqliteConnection::open_memory().unwrap()
}

fn select_all(orm: &Shillelagh<SqliteConnection>, table: &str) -> Vec<Row> {
    orm.connection()
        .query(&format!("SELECT * FROM {table} ORDER BY id"), &[])
        .unwrap()
}

fn table_exists(orm: &Shillelagh<SqliteConnection>, table: &str) -> bool {
    !orm.connection()
        .query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            &[Value::from(table)],
        )
        .unwrap()
        .is_empty()
}

#[test]
fn table_name_matches_create_statement() {
    let orm = Shillelagh::new(memory());

    let name = orm.get_table_name::<Person>().unwrap();
    let sql = create_table_sql(&orm.table_object::<Person>().unwrap());

    assert_eq!(name, "people");
    assert_eq!(
        sql,
        "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)"
    );
    assert_eq!(orm.get_table_name::<TreeNode>().unwrap(), "TreeNode");
}

#[test]
fn create_drop_cycle() {
    let orm = Shillelagh::new(memory());

    for _ in 0..2 {
        orm.create_table::<Person>().unwrap();
        assert!(table_exists(&orm, "people"));
        orm.drop_table::<Person>().unwrap();
        assert!(!table_exists(&orm, "people"));
    }
}

#[test]
fn drop_missing_table_is_ok() {
    let orm = Shillelagh::new(memory());

    orm.drop_table::<Person>().unwrap();

    assert_eq!(
        drop_table_sql(&orm.table_object::<Person>().unwrap()),
        "DROP TABLE IF EXISTS people"
    );
}

#[test]
fn create_existing_table_fails() {
    let orm = Shillelagh::new(memory());
    orm.create_table::<Person>().unwrap();

    let err = orm.create_table::<Person>().unwrap_err();

    assert!(matches!(err, Error::Query(_)));
}

#[test]
fn skipped_fields_are_not_stored() {
    let orm = Shillelagh::new(memory());
    orm.create_table::<Person>().unwrap();
    let mut person = Person {
        id: None,
        name: "Ada".to_string(),
        age: 36,
        cached_greeting: "hello".to_string(),
    };

    orm.insert(&mut person).unwrap();

    let rows = select_all(&orm, "people");
    assert_eq!(rows[0].columns(), ["id", "name", "age"]);
    assert_eq!(rows[0].get_named("NAME"), Some(&Value::from("Ada")));
}

#[test]
fn self_referential_tree_inserts_depth_first() {
    let orm = Shillelagh::new(memory());
    orm.create_table::<TreeNode>().unwrap();
    let mut root = TreeNode::with_children(
        "root",
        vec![
            TreeNode::with_children("left", vec![TreeNode::leaf("left.leaf")]),
            TreeNode::leaf("right"),
        ],
    );

    orm.insert(&mut root).unwrap();

    assert_eq!(root.id, Some(1));
    assert_eq!(root.children[0].id, Some(2));
    assert_eq!(root.children[0].parent, Some(1));
    assert_eq!(root.children[0].children[0].id, Some(3));
    assert_eq!(root.children[0].children[0].parent, Some(2));
    assert_eq!(root.children[1].id, Some(4));
    assert_eq!(root.children[1].parent, Some(1));

    let rows = select_all(&orm, "TreeNode");
    let parents: Vec<Option<i64>> = rows.iter().map(|row| row.get_i64(2)).collect();
    assert_eq!(parents, vec![None, Some(1), Some(2), Some(1)]);
}

#[test]
fn literal_and_bound_statements_store_the_same_rows() {
    let literal = Shillelagh::with_config(
        memory(),
        ShillelaghConfig::default().statement_mode(StatementMode::Literal),
    );
    let bound = Shillelagh::new(memory());

    for orm in [&literal, &bound] {
        orm.create_table::<Person>().unwrap();
        let mut person = Person {
            id: None,
            name: "Brien".to_string(),
            age: -4,
            ..Person::default()
        };
        orm.insert(&mut person).unwrap();
        person.name = "updated".to_string();
        orm.update(&person).unwrap();
    }

    let literal_rows = select_all(&literal, "people");
    let bound_rows = select_all(&bound, "people");
    assert_eq!(literal_rows, bound_rows);
    assert_eq!(bound_rows[0].get_str(1), Some("updated"));
}

#[test]
fn failed_graph_without_transaction_keeps_parent() {
    let orm = Shillelagh::new(memory());
    orm.create_table::<Album>().unwrap();
    let mut album = Album {
        id: None,
        title: "Unfinished".to_string(),
        tracks: vec![Track::default()],
    };

    let err = orm.insert(&mut album).unwrap_err();

    assert!(matches!(err, Error::Query(_)));
    assert_eq!(select_all(&orm, "Album").len(), 1);
}

#[test]
fn failed_graph_with_transaction_rolls_back() {
    let orm = Shillelagh::with_config(
        memory(),
        ShillelaghConfig::default().transactional_graphs(true),
    );
    orm.create_table::<Album>().unwrap();
    let mut album = Album {
        id: None,
        title: "Unfinished".to_string(),
        tracks: vec![Track::default()],
    };

    orm.insert(&mut album).unwrap_err();

    assert!(select_all(&orm, "Album").is_empty());
    assert_eq!(album.id, None);
    assert_eq!(album.tracks[0].album_id, None);
    assert_eq!(album.tracks[0].id, None);
}

#[test]
fn transactional_graph_commits() {
    let orm = Shillelagh::with_config(
        memory(),
        ShillelaghConfig::default().transactional_graphs(true),
    );
    orm.create_table::<Album>().unwrap();
    orm.create_table::<Track>().unwrap();
    let mut album = Album {
        id: None,
        title: "Complete".to_string(),
        tracks: vec![
            Track {
                title: "One".to_string(),
                ..Track::default()
            },
            Track {
                title: "Two".to_string(),
                ..Track::default()
            },
        ],
    };

    orm.insert(&mut album).unwrap();

    assert_eq!(select_all(&orm, "Album").len(), 1);
    let tracks = select_all(&orm, "Track");
    assert_eq!(tracks.len(), 2);
    assert!(tracks.iter().all(|row| row.get_i64(2) == Some(1)));
    assert_eq!(album.tracks[1].album_id, Some(1));
}

#[test]
fn boxed_self_referential_one_to_one_inserts_tail_first() {
    let orm = Shillelagh::new(memory());
    orm.create_table::<LinkedNode>().unwrap();
    let mut head = LinkedNode::chain(&["a", "b", "c"]).unwrap();

    orm.insert(&mut *head).unwrap();

    assert_eq!(head.id, Some(3));
    let second = head.next.as_ref().unwrap();
    assert_eq!(second.id, Some(2));
    assert_eq!(second.next.as_ref().and_then(|n| n.id), Some(1));

    let rows = select_all(&orm, "LinkedNode");
    let links: Vec<(Option<&str>, Option<i64>)> =
        rows.iter().map(|row| (row.get_str(1), row.get_i64(2))).collect();
    assert_eq!(links, vec![(Some("c"), None), (Some("b"), Some(1)), (Some("a"), Some(2))]);
}

#[test]
fn mutually_referencing_one_to_one_schemas_resolve() {
    let orm = Shillelagh::new(memory());
    orm.create_table::<Husband>().unwrap();
    orm.create_table::<Wife>().unwrap();

    let husband = orm.table_object::<Husband>().unwrap();
    let wife = orm.table_object::<Wife>().unwrap();
    assert_eq!(husband.relationships()[0].target_table, "Wife");
    assert_eq!(wife.relationships()[0].target_table, "Husband");
    assert_eq!(orm.registry().len(), 2);

    let mut husband = Husband {
        id: None,
        name: "Ed".to_string(),
        spouse: Some(Box::new(Wife {
            id: None,
            name: "Jo".to_string(),
            spouse: None,
        })),
    };
    orm.insert(&mut husband).unwrap();

    let rows = select_all(&orm, "Husband");
    assert_eq!(rows[0].get_i64(2), husband.spouse.as_ref().and_then(|w| w.id));
}

#[test]
fn orm_only_uses_declared_constructor() {
    let draft = Draft::orm_only();

    assert_eq!(draft.title, "untitled");
    assert_eq!(draft.row_id(), None);
}
