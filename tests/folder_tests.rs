use bwres::folder::default_pack_output;
use bwres::io::{read_archive_bytes, read_archive_file, write_archive_file};
use bwres::{
    pack_folder, unpack_to_folder, Animation, Archive, Effect, GameVariant, Model, Resource, ResourceInfo, Script,
    Tag, Texture,
};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn sample(variant: GameVariant) -> Archive {
    let mut archive = Archive::new(variant, "C3_Assault");
    archive.textures.push(Texture::new(variant, "SKY", vec![0; 32]).unwrap());
    archive.textures.push(Texture::new(variant, "TANKTEX", vec![1; 16]).unwrap());
    archive.models.push(Model::new("TANK", b"mesh TANKTEX mesh".to_vec()));
    archive.push_sound("Explosion", vec![2; 64]).unwrap();
    archive.animations.push(Animation::new("idle", vec![3; 12]));
    archive.effects.push(Effect::new("fire", b"particles".to_vec()));
    archive.scripts.push(Script::new("EndMission", vec![4; 6]));
    archive.unknown.push(Resource::new(Tag(*b"ZYXW"), vec![5, 6, 7]));
    archive
}

#[test]
fn test_unpack_layout() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("C3_Folder");
    unpack_to_folder(&sample(GameVariant::BattalionWars), &out).unwrap();

    assert!(out.join("Models/TANK/TANK.modl").is_file());
    assert!(out.join("Models/TANK/TANKTEX.texture").is_file());
    assert!(!out.join("Textures/TANKTEX.texture").exists());
    assert!(out.join("Textures/SKY.texture").is_file());
    assert!(out.join("Sounds/Explosion.adp").is_file());
    assert!(out.join("Animations/idle.anim").is_file());
    assert!(out.join("SpecialEffects/fire.txt").is_file());
    assert!(out.join("Scripts/EndMission.luap").is_file());
    assert!(out.join("Unknown/0000.5A595857.chunk").is_file());

    // Texture files hold the whole payload, name field included.
    let sky = fs::read(out.join("Textures/SKY.texture")).unwrap();
    assert_eq!(sky.len(), 16 + 32);
    assert_eq!(&sky[..4], b"SKY\0");
    assert_eq!(fs::read(out.join("Scripts/EndMission.luap")).unwrap(), vec![4; 6]);
}

#[test]
fn test_resinfo_format() {
    let dir = TempDir::new().unwrap();
    let info = ResourceInfo {
        game: GameVariant::BattalionWars2,
        level_name: "MP_Grass".to_string(),
    };
    info.save(dir.path()).unwrap();

    let text = fs::read_to_string(dir.path().join("resinfo.txt")).unwrap();
    assert_eq!(text, "{\n    \"Game\": \"Battalion Wars 2\",\n    \"Level name\": \"MP_Grass\"\n}");
    assert_eq!(ResourceInfo::load(dir.path()).unwrap(), info);
}

#[test]
fn test_unpack_then_pack() {
    for variant in [GameVariant::BattalionWars, GameVariant::BattalionWars2] {
        let dir = TempDir::new().unwrap();
        let original = sample(variant);
        unpack_to_folder(&original, dir.path()).unwrap();

        let packed = pack_folder(dir.path()).unwrap();
        assert_eq!(packed.variant, variant);
        assert_eq!(packed.level_name, "C3_Assault");
        assert_eq!(packed.models, original.models);
        assert_eq!(packed.sounds, original.sounds);
        assert_eq!(packed.animations, original.animations);
        assert_eq!(packed.effects, original.effects);
        assert_eq!(packed.scripts, original.scripts);
        assert_eq!(packed.unknown, original.unknown);

        // Model folders are walked before Textures/.
        let names: Vec<String> = packed.textures.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["TANKTEX", "SKY"]);
        assert_eq!(packed.textures[1], original.textures[0]);

        // Re-encoding the packed archive decodes to the same contents.
        let decoded = Archive::from_bytes(&packed.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.textures, packed.textures);
        assert_eq!(decoded.scripts, packed.scripts);
    }
}

#[test]
fn test_pack_skips_duplicate_textures() {
    let dir = TempDir::new().unwrap();
    ResourceInfo {
        game: GameVariant::BattalionWars,
        level_name: "Dup".to_string(),
    }
    .save(dir.path())
    .unwrap();
    fs::create_dir_all(dir.path().join("Models/A")).unwrap();
    fs::create_dir_all(dir.path().join("Models/B")).unwrap();
    let payload = Texture::new(GameVariant::BattalionWars, "shared", vec![1; 4])
        .unwrap()
        .payload(GameVariant::BattalionWars)
        .unwrap();
    fs::write(dir.path().join("Models/A/shared.texture"), &payload).unwrap();
    fs::write(dir.path().join("Models/B/shared.texture"), &payload).unwrap();

    let packed = pack_folder(dir.path()).unwrap();
    assert_eq!(packed.textures.len(), 1);
}

#[test]
fn test_pack_rejects_long_sound_name() {
    let dir = TempDir::new().unwrap();
    ResourceInfo {
        game: GameVariant::BattalionWars,
        level_name: "Long".to_string(),
    }
    .save(dir.path())
    .unwrap();
    fs::create_dir_all(dir.path().join("Sounds")).unwrap();
    fs::write(dir.path().join(format!("Sounds/{}.adp", "s".repeat(33))), [0u8; 4]).unwrap();

    assert!(pack_folder(dir.path()).is_err());
}

#[test]
fn test_gzip_archive_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("level.res.gz");
    let archive = sample(GameVariant::BattalionWars2);
    write_archive_file(&path, &archive, None).unwrap();

    let raw = fs::read(&path).unwrap();
    assert_eq!(&raw[..2], &[0x1F, 0x8B]);
    assert_eq!(read_archive_bytes(&path).unwrap(), archive.to_bytes().unwrap());

    let decoded = read_archive_file(&path).unwrap();
    assert_eq!(decoded.level_name, archive.level_name);
    assert_eq!(decoded.textures, archive.textures);
}

#[test]
fn test_plain_archive_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("level.res");
    let archive = sample(GameVariant::BattalionWars);
    write_archive_file(&path, &archive, None).unwrap();
    assert_eq!(fs::read(&path).unwrap(), archive.to_bytes().unwrap());

    // Forced compression still reads back through the magic check.
    write_archive_file(&path, &archive, Some(true)).unwrap();
    assert_eq!(read_archive_bytes(&path).unwrap(), archive.to_bytes().unwrap());
}

#[test]
fn test_failed_encode_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.res");
    let mut archive = sample(GameVariant::BattalionWars);
    archive.sounds.pop();

    assert!(write_archive_file(&path, &archive, None).is_err());
    assert!(!path.exists());
}

#[test]
fn test_empty_names_survive_unpack_and_pack() {
    let dir = TempDir::new().unwrap();
    let mut archive = Archive::new(GameVariant::BattalionWars, "Blank");
    archive.textures.push(Texture::new(GameVariant::BattalionWars, "", vec![9; 8]).unwrap());
    archive.models.push(Model::new("", b"mesh".to_vec()));
    unpack_to_folder(&archive, dir.path()).unwrap();
    assert!(dir.path().join("Models/.modl").is_file());
    assert!(dir.path().join("Textures/.texture").is_file());

    let packed = pack_folder(dir.path()).unwrap();
    assert_eq!(packed.models, archive.models);
    assert_eq!(packed.textures, archive.textures);
}

#[test]
fn test_effect_named_resinfo_is_packed() {
    let dir = TempDir::new().unwrap();
    let mut archive = Archive::new(GameVariant::BattalionWars, "Info");
    archive.effects.push(Effect::new("resinfo", b"sparks".to_vec()));
    unpack_to_folder(&archive, dir.path()).unwrap();

    let packed = pack_folder(dir.path()).unwrap();
    assert_eq!(packed.effects, archive.effects);
    assert_eq!(packed.level_name, "Info");
}

#[test]
fn test_default_pack_output() {
    let bw = ResourceInfo {
        game: GameVariant::BattalionWars,
        level_name: "L".to_string(),
    };
    let bw2 = ResourceInfo {
        game: GameVariant::BattalionWars2,
        level_name: "L".to_string(),
    };
    let dir = TempDir::new().unwrap();

    assert_eq!(
        default_pack_output(&dir.path().join("X.res_Folder"), &bw2),
        (dir.path().join("X.res"), true)
    );
    assert_eq!(
        default_pack_output(&dir.path().join("level"), &bw2),
        (dir.path().join("level.res.gz"), true)
    );
    assert_eq!(
        default_pack_output(&dir.path().join("C1.res_Folder"), &bw),
        (dir.path().join("C1.res"), false)
    );
    assert_eq!(
        default_pack_output(&dir.path().join("C1.res.gz_Folder"), &bw),
        (dir.path().join("C1.res.gz"), true)
    );

    // A Battalion Wars 2 archive packed to a derived `.res` name is still gzipped.
    let (path, compress) = default_pack_output(&dir.path().join("C1.res_Folder"), &bw2);
    let archive = sample(GameVariant::BattalionWars2);
    write_archive_file(&path, &archive, Some(compress)).unwrap();
    assert_eq!(&fs::read(&path).unwrap()[..2], &[0x1F, 0x8B]);
    assert_eq!(read_archive_bytes(&path).unwrap(), archive.to_bytes().unwrap());
}
