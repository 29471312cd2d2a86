//! Program Manager DDE conformance
//!
//! Replays the Program Manager DDE test sequence end to end: parser
//! quirks, group and item lifecycle, ShowGroup and the current group
//! carried across a second conversation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use shell32::dde::{
    DdeServer, HCONV, DMLERR_NOTPROCESSED, DMLERR_NO_ERROR, HDDEDATA_TRUE, NULL_HDDEDATA,
    PROGMAN_TOPIC, XTYP_EXECUTE,
};
use shell32::shelllink::ShellLink;
use shell32::window::CABINET_CLASS;
use shell32::{ProgmanConfig, ProgmanServer, PROGMAN_SERVICE};

struct Env {
    _dir: tempfile::TempDir,
    programs: PathBuf,
    windows_dir: PathBuf,
    dde: DdeServer,
}

impl Env {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();

        let windows_dir = dir.path().join("windows");
        fs::create_dir(&windows_dir).unwrap();
        fs::write(windows_dir.join("notepad.exe"), b"MZ\x90\x00").unwrap();
        fs::write(windows_dir.join("system.ini"), b"[drivers]\r\n").unwrap();

        let programs = dir.path().join("Programs");
        let config = ProgmanConfig::with_programs_dir(&programs).search_path(vec![windows_dir.clone()]);
        let dde = DdeServer::new(Arc::new(ProgmanServer::new(config)));

        Env {
            _dir: dir,
            programs,
            windows_dir,
            dde,
        }
    }

    fn connect(&self) -> HCONV {
        self.dde.connect(PROGMAN_SERVICE, PROGMAN_TOPIC).unwrap()
    }

    /// Execute with a NUL-terminated payload, checking the data handle
    fn execute(&self, hconv: HCONV, command: &str) -> u32 {
        let mut data = command.as_bytes().to_vec();
        data.push(0);

        let result = self.dde.client_transaction(hconv, &data, None, XTYP_EXECUTE);
        let expected = if result.error == DMLERR_NO_ERROR {
            HDDEDATA_TRUE
        } else {
            NULL_HDDEDATA
        };
        assert_eq!(result.hdata, expected, "data handle for {:?}", command);
        result.error
    }

    fn exists(&self, rel: &str) -> bool {
        self.programs.join(rel).exists()
    }

    fn window_exists(&self, title: &str) -> bool {
        self.dde
            .progman()
            .windows()
            .find_window(Some(CABINET_CLASS), title)
            .is_some()
    }
}

fn expect(env: &Env, hconv: HCONV, command: &str, code: u32) {
    assert_eq!(env.execute(hconv, command), code, "{:?}", command);
}

fn parser_sequence(env: &Env, hconv: HCONV) {
    for command in [
        "[InvalidCommand()]",
        "",
        "CreateGroup",
        "[CreateGroup",
        "[CreateGroup]",
        "[CreateGroup()]",
    ] {
        expect(env, hconv, command, DMLERR_NOTPROCESSED);
    }
    assert!(!env.programs.exists());

    expect(env, hconv, "[cREATEgROUP(test)]", DMLERR_NO_ERROR);
    assert!(env.exists("test"));
    assert!(env.window_exists("test"));

    expect(env, hconv, "[AddItem(notepad,foobar)]", DMLERR_NO_ERROR);
    assert!(env.exists("test/foobar.lnk"));

    expect(env, hconv, "[AddItem(notepad,foo bar)]", DMLERR_NO_ERROR);
    assert!(env.exists("test/foo bar.lnk"));

    expect(env, hconv, "[AddItem(notepad,a[b,c]d)]", DMLERR_NOTPROCESSED);
    assert!(!env.exists("test/a[b,c.lnk"));

    expect(env, hconv, "[AddItem(notepad,\"a[b,c]d\")]", DMLERR_NO_ERROR);
    assert!(env.exists("test/a[b,c]d.lnk"));

    expect(env, hconv, "  [  AddItem  (  notepad  ,  test  )  ]  ", DMLERR_NO_ERROR);
    assert!(env.exists("test/test.lnk"));

    expect(env, hconv, "[AddItem(notepad,one)][AddItem(notepad,two)]", DMLERR_NO_ERROR);
    assert!(env.exists("test/one.lnk"));
    assert!(env.exists("test/two.lnk"));

    expect(env, hconv, "[FakeCommand(test)][DeleteGroup(test)]", DMLERR_NOTPROCESSED);
    assert!(env.exists("test"));

    expect(env, hconv, "[CreateGroup(kept)][FakeCommand()]", DMLERR_NOTPROCESSED);
    assert!(env.exists("kept"));
    assert!(env.window_exists("kept"));
    expect(env, hconv, "[DeleteGroup(kept)]", DMLERR_NO_ERROR);

    expect(env, hconv, "[DeleteGroup(test)]", DMLERR_NO_ERROR);
    assert!(!env.exists("test"));
    assert!(!env.window_exists("test"));
}

fn group_sequence(env: &Env, hconv: HCONV) {
    expect(env, hconv, "[CreateGroup(Group1)]", DMLERR_NO_ERROR);
    assert!(env.exists("Group1"));
    assert!(env.window_exists("Group1"));

    expect(env, hconv, "[AddItem]", DMLERR_NOTPROCESSED);
    expect(env, hconv, "[AddItem(test)]", DMLERR_NOTPROCESSED);

    expect(env, hconv, "[AddItem(notepad.exe)]", DMLERR_NO_ERROR);
    assert!(env.exists("Group1/notepad.lnk"));

    expect(env, hconv, "[DeleteItem(notepad.exe)]", DMLERR_NOTPROCESSED);

    expect(env, hconv, "[DeleteItem(notepad)]", DMLERR_NO_ERROR);
    assert!(!env.exists("Group1/notepad.lnk"));

    expect(env, hconv, "[DeleteItem(notepad)]", DMLERR_NOTPROCESSED);

    expect(env, hconv, "[AddItem(notepad)]", DMLERR_NO_ERROR);
    assert!(env.exists("Group1/notepad.lnk"));
    expect(env, hconv, "[AddItem(notepad)]", DMLERR_NO_ERROR);

    let system_ini = env.windows_dir.join("system.ini");
    expect(env, hconv, &format!("[AddItem({})]", system_ini.display()), DMLERR_NO_ERROR);
    assert!(env.exists("Group1/system.lnk"));

    // Paths must name an existing file
    expect(env, hconv, &format!("[AddItem({})]", env.windows_dir.display()), DMLERR_NOTPROCESSED);
    let missing = env.windows_dir.join("missing.ini");
    expect(env, hconv, &format!("[AddItem({})]", missing.display()), DMLERR_NOTPROCESSED);

    expect(env, hconv, "[AddItem(notepad,test1)]", DMLERR_NO_ERROR);
    assert!(env.exists("Group1/test1.lnk"));

    expect(env, hconv, "[DeleteItem(test1)]", DMLERR_NO_ERROR);
    assert!(!env.exists("Group1/test1.lnk"));

    expect(env, hconv, "[ShowGroup(Group1)]", DMLERR_NOTPROCESSED);

    expect(env, hconv, "[ShowGroup(Group1, 0)]", DMLERR_NO_ERROR);
    assert!(env.window_exists("Group1"));

    expect(env, hconv, "[CreateGroup(Group2)]", DMLERR_NO_ERROR);
    assert!(env.exists("Group2"));
    assert!(env.window_exists("Group2"));

    expect(env, hconv, "[AddItem(notepad,test2)]", DMLERR_NO_ERROR);
    assert!(env.exists("Group2/test2.lnk"));

    expect(env, hconv, "[ShowGroup(Group1, 0)]", DMLERR_NO_ERROR);
    assert!(env.window_exists("Group1"));

    expect(env, hconv, "[AddItem(notepad,test3)]", DMLERR_NO_ERROR);
    assert!(env.exists("Group1/test3.lnk"));

    expect(env, hconv, "[DeleteGroup(Group1)]", DMLERR_NO_ERROR);
    assert!(!env.exists("Group1"));

    expect(env, hconv, "[DeleteGroup(Group1)]", DMLERR_NOTPROCESSED);

    expect(env, hconv, "[ShowGroup(Group2, 0)]", DMLERR_NO_ERROR);
    assert!(env.window_exists("Group2"));
}

fn second_connection_sequence(env: &Env, hconv: HCONV) {
    expect(env, hconv, "[AddItem(notepad)]", DMLERR_NO_ERROR);
    assert!(env.exists("Group2/notepad.lnk"));

    expect(env, hconv, "[DeleteGroup(Group2)]", DMLERR_NO_ERROR);
    assert!(!env.exists("Group2"));
}

#[test]
fn test_progman_dde_sequence() {
    let env = Env::new();

    let hconv = env.connect();
    parser_sequence(&env, hconv);
    group_sequence(&env, hconv);
    assert!(env.dde.disconnect(hconv));

    let hconv = env.connect();
    second_connection_sequence(&env, hconv);
    assert!(env.dde.disconnect(hconv));

    assert_eq!(env.dde.conversation_count(), 0);
}

#[test]
fn test_item_link_points_at_target() {
    let env = Env::new();
    let hconv = env.connect();

    expect(&env, hconv, "[CreateGroup(Accessories)]", DMLERR_NO_ERROR);
    expect(&env, hconv, "[AddItem(notepad,\"Text Editor\")]", DMLERR_NO_ERROR);

    let link = ShellLink::load(&env.programs.join("Accessories/Text Editor.lnk")).unwrap();
    let target = Path::new(&link.target_path);
    assert_eq!(target.file_name().unwrap(), "notepad.exe");
    assert_eq!(link.description.as_deref(), Some("Text Editor"));
    assert_eq!(link.file_size, 4);
}

#[test]
fn test_groups_request_lists_directories() {
    let env = Env::new();
    let hconv = env.connect();

    assert_eq!(env.dde.request(hconv, "Groups").unwrap(), b"\0");

    expect(&env, hconv, "[CreateGroup(Games)][CreateGroup(Accessories)]", DMLERR_NO_ERROR);
    assert_eq!(env.dde.request(hconv, "Groups").unwrap(), b"Accessories\r\nGames\0");
}

#[test]
fn test_full_path_titles() {
    let dir = tempfile::tempdir().unwrap();
    let config = ProgmanConfig::with_programs_dir(dir.path()).full_path_title(true);
    let dde = DdeServer::new(Arc::new(ProgmanServer::new(config)));
    let hconv = dde.connect(PROGMAN_SERVICE, PROGMAN_TOPIC).unwrap();

    assert_eq!(dde.execute(hconv, b"[CreateGroup(Group1)]\0"), DMLERR_NO_ERROR);

    let title = format!("{}\\Group1", dir.path().display());
    let windows = dde.progman().windows();
    assert!(windows.find_window(Some(CABINET_CLASS), &title).is_some());
    assert!(windows.find_window(Some(CABINET_CLASS), "Group1").is_none());

    assert_eq!(dde.execute(hconv, b"[DeleteGroup(Group1)]\0"), DMLERR_NO_ERROR);
    assert_eq!(windows.count(), 0);
}
