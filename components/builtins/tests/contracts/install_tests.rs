//! Registration by name and by classic number

use builtins::{install, install_classic, standard, BufferedConsole};
use bytecode_system::ImageBuilder;
use interpreter::{Vm, VmConfig};

#[test]
fn test_install_uses_program_numbering() {
    let mut b = ImageBuilder::new();
    b.builtin("dprint", 2, &[1]);
    b.builtin("strcat", 7, &[1, 1]);
    b.builtin("unrelated", 3, &[]);
    let mut vm = Vm::new(b.build().unwrap(), VmConfig::default(), BufferedConsole::new());
    let mut installed = install(&mut vm);
    installed.sort();
    assert_eq!(installed, vec![("dprint", 2), ("strcat", 7)]);
    assert!(vm.builtins().get(2).is_some());
    assert!(vm.builtins().get(25).is_none());
    assert!(vm.builtins().get(3).is_none());
}

#[test]
fn test_install_classic_registers_everything() {
    let mut vm = Vm::new(ImageBuilder::new().build().unwrap(), VmConfig::default(), ());
    install_classic(&mut vm);
    assert_eq!(vm.builtins().len(), standard::<()>().len());
    let names: Vec<_> = vm.builtins().iter().map(|(n, name)| (n, name.to_string())).collect();
    assert_eq!(names[0], (10, "error".to_string()));
    assert_eq!(names.last().cloned(), Some((115, "strcat".to_string())));
}

#[test]
fn test_unit_host_logs_instead_of_printing() {
    use builtins::Console;
    // must not panic without a subscriber
    ().print("to the log\n");
}
