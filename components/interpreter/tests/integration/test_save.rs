//! Save and restore of globals and entities

use bytecode_system::{ImageBuilder, LoadOptions, Opcode, Program};
use core_types::{EType, ProgsError, Vec3};
use interpreter::{EntitySnapshot, GlobalSnapshot, SavedValue, Vm, VmConfig};

fn program() -> Program {
    let mut b = ImageBuilder::new();
    b.saved_global("skill", EType::Float);
    b.saved_global("spawn_pos", EType::Vector);
    b.saved_global("mapname", EType::String);
    b.saved_global("player", EType::Entity);
    b.saved_global("next_level", EType::Function);
    b.global("frametime", EType::Float);
    b.field("health", EType::Float);
    b.field("origin", EType::Vector);
    b.field("origin_x", EType::Float);
    b.field("classname", EType::String);
    b.field("think", EType::Function);
    b.begin_function("start", &[]);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();
    Program::load(&b.to_bytes(), &LoadOptions::default()).unwrap()
}

fn vm() -> Vm {
    Vm::new(program(), VmConfig::default(), ())
}

#[test]
fn test_globals_round_trip_through_json() {
    let mut a = vm();
    a.set_global_f32("skill", 2.0).unwrap();
    a.set_global_vector("spawn_pos", Vec3::new(1.0, 2.0, 3.0)).unwrap();
    let name = a.strings_mut().alloc_temp("e1m1");
    a.set_global_i32("mapname", name).unwrap();
    a.set_global_i32("player", 1).unwrap();
    let start = a.program().find_function("start").unwrap() as i32;
    a.set_global_i32("next_level", start).unwrap();
    a.set_global_f32("frametime", 0.1).unwrap();

    let snapshot = a.export_globals().unwrap();
    assert_eq!(snapshot.values.len(), 5);
    assert!(!snapshot.values.contains_key("frametime"));
    assert_eq!(
        snapshot.values["mapname"],
        SavedValue::String("e1m1".to_string())
    );
    assert_eq!(
        snapshot.values["next_level"],
        SavedValue::Function("start".to_string())
    );

    let json = serde_json::to_string(&snapshot).unwrap();
    let parsed: GlobalSnapshot = serde_json::from_str(&json).unwrap();

    let mut b = vm();
    b.import_globals(&parsed).unwrap();
    assert_eq!(b.global_f32("skill").unwrap(), 2.0);
    assert_eq!(b.global_vector("spawn_pos").unwrap(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(b.global_i32("player").unwrap(), 1);
    assert_eq!(b.global_i32("next_level").unwrap(), start);
    let handle = b.global_i32("mapname").unwrap();
    // restored strings are static
    assert!(handle > 0);
    assert_eq!(b.strings().get(handle).unwrap(), b"e1m1");
}

#[test]
fn test_import_rejects_unknown_and_mistyped_values() {
    let mut vm = vm();
    let mut snapshot = GlobalSnapshot::default();
    snapshot
        .values
        .insert("frametime".to_string(), SavedValue::Float(1.0));
    assert!(matches!(vm.import_globals(&snapshot), Err(ProgsError::Save(_))));

    let mut snapshot = GlobalSnapshot::default();
    snapshot
        .values
        .insert("skill".to_string(), SavedValue::Entity(1));
    assert!(matches!(vm.import_globals(&snapshot), Err(ProgsError::Save(_))));

    let mut snapshot = GlobalSnapshot::default();
    snapshot.values.insert(
        "next_level".to_string(),
        SavedValue::Function("missing".to_string()),
    );
    assert!(matches!(vm.import_globals(&snapshot), Err(ProgsError::Save(_))));
}

#[test]
fn test_entity_export_skips_zero_and_component_fields() {
    let mut vm = vm();
    let ent = vm.entities_mut().spawn().unwrap();
    let health = vm.field_offset("health").unwrap();
    let origin = vm.field_offset("origin").unwrap();
    let classname = vm.field_offset("classname").unwrap();
    vm.entities_mut().set_f32(ent, health, 100.0).unwrap();
    vm.entities_mut()
        .set_vector(ent, origin, Vec3::new(5.0, 0.0, 0.0))
        .unwrap();
    let text = vm.strings_mut().intern("monster_dog");
    vm.entities_mut().set_u32(ent, classname, text as u32).unwrap();

    let snapshot = vm.export_entity(ent).unwrap();
    let names: Vec<_> = snapshot.fields.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["classname", "health", "origin"]);
    assert_eq!(
        snapshot.fields["origin"],
        SavedValue::Vector([5.0, 0.0, 0.0])
    );
}

#[test]
fn test_entity_import_clears_record_first() {
    let mut vm = vm();
    let ent = vm.entities_mut().spawn().unwrap();
    let health = vm.field_offset("health").unwrap();
    let think = vm.field_offset("think").unwrap();
    vm.entities_mut().set_u32(ent, think, 1).unwrap();

    let mut snapshot = EntitySnapshot::default();
    snapshot
        .fields
        .insert("health".to_string(), SavedValue::Float(30.0));
    vm.import_entity(ent, &snapshot).unwrap();
    assert_eq!(vm.entities().get_f32(ent, health).unwrap(), 30.0);
    assert_eq!(vm.entities().get_u32(ent, think).unwrap(), 0);

    assert!(matches!(
        vm.import_entity(42, &snapshot),
        Err(ProgsError::BadEntity(42))
    ));
}
