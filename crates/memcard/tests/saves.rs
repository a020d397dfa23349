use std::fs;

use memcard::dir_entry::{DirEntry, SAVE_DIR_MODE};
use memcard::{Error, ExportFormat, IconSysTitle, Memcard, NoTitle, SizeTier};
use tempfile::tempdir;

fn sample_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 + 1).collect()
}

fn card_with_save(name: &str, len: usize) -> Memcard {
    let mut card = Memcard::blank(SizeTier::Mb8);
    card.import(name, &sample_data(len), 1_700_000_000)
        .expect("import save");
    card
}

#[test]
fn listed_saves_describe_their_entries() {
    let card = card_with_save("BASLUS-21442GTA", 3000);
    let saves = card.list_saves();
    assert_eq!(saves.len(), 1);

    let save = &saves[0];
    assert_eq!(save.directory_name, "BASLUS-21442GTA");
    assert_eq!(save.title, "BASLUS-21442GTA");
    assert_eq!(save.product_code, "BASLUS-2144");
    assert_eq!(save.size, 3000);
    assert_eq!(save.created, 1_700_000_000);
    assert_eq!(save.cluster, card.geometry().first_data_cluster());
    assert_eq!(save.mode, SAVE_DIR_MODE);
}

#[test]
fn entries_with_invalid_clusters_are_skipped() {
    let mut card = card_with_save("BASLUS-21442", 100);
    for (slot, cluster) in [(5, 0u16), (6, 1), (7, 0xFFFF)] {
        card.write_dir_entry(
            slot,
            &DirEntry {
                name: format!("BROKEN{slot}"),
                mode: SAVE_DIR_MODE,
                length: 10,
                created: 0,
                cluster,
                dir_index: slot as u16,
            },
        );
    }

    let names: Vec<String> = card
        .list_saves()
        .into_iter()
        .map(|save| save.directory_name)
        .collect();
    assert_eq!(names, vec!["BASLUS-21442"]);
}

#[test]
fn rename_rejects_long_names_without_touching_the_entry() {
    let mut card = card_with_save("BESLES-12345", 100);
    let save = card.list_saves().remove(0);
    let before = card.as_bytes().to_vec();

    let err = card
        .rename(&save, "BESLES-12345SAVE0")
        .expect_err("17 characters must fail");

    assert!(matches!(err, Error::NameTooLong(17)));
    assert!(err.to_string().contains("name too long"));
    assert_eq!(card.as_bytes(), &before[..]);
    assert_eq!(card.list_saves()[0].directory_name, "BESLES-12345");
}

#[test]
fn rename_accepts_sixteen_characters() {
    let mut card = card_with_save("BESLES-12345", 100);
    let save = card.list_saves().remove(0);

    card.rename(&save, "BESLES-12345SAVE").expect("rename");

    let renamed = card.list_saves().remove(0);
    assert_eq!(renamed.directory_name, "BESLES-12345SAVE");
    assert_eq!(renamed.cluster, save.cluster);
    assert_eq!(renamed.size, save.size);
    assert_eq!(card.find_by_name("BESLES-12345"), None);
}

#[test]
fn rename_keeps_names_unique() {
    let mut card = card_with_save("BASLUS-00001", 100);
    card.import("BASLUS-00002", b"two", 0).expect("import");
    let first = card.list_saves().remove(0);

    assert!(matches!(
        card.rename(&first, "BASLUS-00002"),
        Err(Error::NameExists(_))
    ));
    card.rename(&first, "BASLUS-00001")
        .expect("renaming to its own name is fine");
}

#[test]
fn stale_saves_are_not_found() {
    let mut card = card_with_save("BASLUS-21442", 100);
    let save = card.list_saves().remove(0);
    card.delete(&save).expect("delete");

    let err = card.rename(&save, "OTHER").expect_err("gone");
    assert!(matches!(err, Error::NotFound(_)));
    assert!(err.to_string().contains("not found"));
    assert!(matches!(card.delete(&save), Err(Error::NotFound(_))));
}

#[test]
fn delete_tombstones_and_frees_the_chain() {
    let mut card = card_with_save("BASLUS-00001", 100);
    card.import("BASLUS-00002", &sample_data(2500), 0)
        .expect("import");
    let saves = card.list_saves();
    let (keep, victim) = (&saves[0], &saves[1]);
    let chain: Vec<u16> = card.walk_chain(victim.cluster).collect();
    assert_eq!(chain.len(), 3);
    let kept_data = card.save_data(keep).expect("data");

    card.delete(victim).expect("delete");

    assert_eq!(
        card.entry_status(victim.slot),
        Some(memcard::EntryStatus::Deleted)
    );
    for cluster in chain {
        assert_eq!(card.read_fat_entry(cluster), 0);
    }
    assert_eq!(card.list_saves(), vec![keep.clone()]);
    assert_eq!(card.save_data(keep).expect("data"), kept_data);
    assert_eq!(card.allocate_slot(), Some(victim.slot));
}

#[test]
fn exports_write_the_raw_chain() {
    let tempdir = tempdir().expect("temp dir");
    let card = card_with_save("BASLUS-21442", 1500);
    let save = card.list_saves().remove(0);

    let psu = tempdir.path().join("save.psu");
    let max = tempdir.path().join("save.max");
    card.export(&save, &psu, ExportFormat::Psu)
        .expect("export psu");
    card.export(&save, &max, ExportFormat::Max)
        .expect("export max");

    let psu_bytes = fs::read(&psu).expect("read psu");
    assert_eq!(psu_bytes.len(), 2048);
    assert_eq!(&psu_bytes[..1500], &sample_data(1500)[..]);
    assert!(psu_bytes[1500..].iter().all(|&b| b == 0));
    assert_eq!(fs::read(&max).expect("read max"), psu_bytes);
}

#[test]
fn export_to_missing_directory_is_an_io_error() {
    let tempdir = tempdir().expect("temp dir");
    let card = card_with_save("BASLUS-21442", 10);
    let save = card.list_saves().remove(0);

    let output = tempdir.path().join("missing").join("save.psu");
    assert!(matches!(
        card.export(&save, &output, ExportFormat::Psu),
        Err(Error::IOError(_))
    ));
}

#[test]
fn inspect_reports_sizes_and_decoded_title() {
    let mut data = vec![0u8; 1800];
    data[0x20..0x30].copy_from_slice(b"Grand Theft Auto");
    let mut card = Memcard::blank(SizeTier::Mb8);
    card.import("BASLUS-20062", &data, 0).expect("import");
    let save = card.list_saves().remove(0);

    let inspection = card.inspect(&save, &IconSysTitle);
    assert_eq!(inspection.raw_size, 2048);
    assert_eq!(inspection.estimated_clusters, 2);
    assert_eq!(inspection.title.as_deref(), Some("Grand Theft Auto"));
    assert_eq!(inspection.error, None);

    assert_eq!(card.inspect(&save, &NoTitle).title, None);
}

#[test]
fn inspect_reports_broken_chains_as_text() {
    let mut card = Memcard::blank(SizeTier::Mb8);
    let past_image = card.geometry().cluster_count() as u16 - 1;
    card.write_dir_entry(
        0,
        &DirEntry {
            name: "BASLUS-99999".to_string(),
            mode: SAVE_DIR_MODE,
            length: 10,
            created: 0,
            cluster: past_image,
            dir_index: 0,
        },
    );
    let save = card.list_saves().remove(0);

    let inspection = card.inspect(&save, &IconSysTitle);
    assert_eq!(inspection.raw_size, 0);
    assert!(inspection.error.is_some());
    assert!(matches!(card.save_data(&save), Err(Error::EmptyChain(_))));
}

#[test]
fn import_validates_before_writing() {
    let mut card = card_with_save("BASLUS-21442", 10);
    let before = card.as_bytes().to_vec();

    assert!(matches!(
        card.import("BASLUS-21442", b"dup", 0),
        Err(Error::NameExists(_))
    ));
    assert!(matches!(
        card.import("A-NAME-THAT-IS-TOO-LONG", b"x", 0),
        Err(Error::NameTooLong(_))
    ));
    assert_eq!(card.as_bytes(), &before[..]);
}

#[test]
fn saves_survive_a_disk_round_trip() {
    let tempdir = tempdir().expect("temp dir");
    let path = tempdir.path().join("card.ps2");
    let mut card = Memcard::create(&path, SizeTier::Mb16).expect("create");
    card.import("BASLUS-21442", &sample_data(4000), 1_650_000_000)
        .expect("import");
    card.persist().expect("persist");

    let reopened = Memcard::open(&path).expect("open");
    assert_eq!(reopened.list_saves(), card.list_saves());
    let save = reopened.list_saves().remove(0);
    assert_eq!(
        &reopened.save_data(&save).expect("data")[..4000],
        &sample_data(4000)[..]
    );
}
