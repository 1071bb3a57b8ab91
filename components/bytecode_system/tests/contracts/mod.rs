//! Contract tests for bytecode_system

mod test_contract_compliance;
