//! Program image - the loaded, validated form of a `progs.dat`
//!
//! Contains the statement, definition and function tables, the static string
//! blob and the initial global data, plus name indices built at load time.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use arrayvec::ArrayVec;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use core_types::layout::{MAX_PARMS, RESERVED_OFS};
use core_types::{ProgsError, ProgsResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crc::crc16;
use crate::defs::{Def, Function, FunctionKind, DEF_SIZE, FUNCTION_SIZE};
use crate::instruction::{Statement, STATEMENT_SIZE};

/// Format version this VM executes
pub const PROG_VERSION: i32 = 6;
/// Size of the header in bytes
pub const HEADER_SIZE: usize = 15 * 4;

/// An `{offset, count}` table descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lump {
    /// Byte offset of the table in the image
    pub offset: i32,
    /// Number of records (bytes for the string table)
    pub count: i32,
}

/// Image header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    /// Format version
    pub version: i32,
    /// Checksum of the declaration set the program was compiled against
    pub crc: i32,
    /// Statement table
    pub statements: Lump,
    /// Global definition table
    pub globaldefs: Lump,
    /// Field definition table
    pub fielddefs: Lump,
    /// Function table
    pub functions: Lump,
    /// String blob
    pub strings: Lump,
    /// Initial global data
    pub globals: Lump,
    /// Slots in one entity record
    pub entity_fields: i32,
}

impl Header {
    fn parse(bytes: &[u8]) -> ProgsResult<Header> {
        if bytes.len() < HEADER_SIZE {
            return Err(ProgsError::format(format!(
                "image is {} bytes, header needs {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }
        let mut r = Cursor::new(&bytes[..HEADER_SIZE]);
        let mut int = || r.read_i32::<LittleEndian>().map_err(truncated);
        let version = int()?;
        let crc = int()?;
        let mut lumps = [Lump::default(); 6];
        for lump in &mut lumps {
            lump.offset = int()?;
            lump.count = int()?;
        }
        let entity_fields = int()?;
        Ok(Header {
            version,
            crc,
            statements: lumps[0],
            globaldefs: lumps[1],
            fielddefs: lumps[2],
            functions: lumps[3],
            strings: lumps[4],
            globals: lumps[5],
            entity_fields,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_i32::<LittleEndian>(self.version)?;
        w.write_i32::<LittleEndian>(self.crc)?;
        for lump in [
            self.statements,
            self.globaldefs,
            self.fielddefs,
            self.functions,
            self.strings,
            self.globals,
        ] {
            w.write_i32::<LittleEndian>(lump.offset)?;
            w.write_i32::<LittleEndian>(lump.count)?;
        }
        w.write_i32::<LittleEndian>(self.entity_fields)
    }
}

/// Options checked while loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Checksum the host's declaration set produces; `None` skips the check
    pub expected_crc: Option<u16>,
}

impl LoadOptions {
    /// Require a specific header checksum
    pub fn with_crc(crc: u16) -> Self {
        Self {
            expected_crc: Some(crc),
        }
    }

    /// Require the checksum of the given declaration text
    pub fn with_declarations(text: &[u8]) -> Self {
        Self::with_crc(crc16(text))
    }
}

/// A loaded program
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Header as read from the image
    pub header: Header,
    /// Statement table
    pub statements: Vec<Statement>,
    /// Global definitions
    pub globaldefs: Vec<Def>,
    /// Field definitions
    pub fielddefs: Vec<Def>,
    /// Function descriptors; index 0 is the null function
    pub functions: Vec<Function>,
    /// NUL-separated static strings
    pub strings: Vec<u8>,
    /// Initial global data
    pub globals: Vec<u32>,
    /// Slots in one entity record
    pub entity_fields: usize,
    global_names: HashMap<String, usize>,
    global_offsets: HashMap<u16, usize>,
    field_names: HashMap<String, usize>,
    function_names: HashMap<String, usize>,
}

impl Program {
    /// Parse and validate an image
    ///
    /// # Errors
    ///
    /// * `ProgsError::Format` - truncated header, wrong version, bad records
    /// * `ProgsError::ChecksumMismatch` - header checksum differs from the expected one
    /// * `ProgsError::TableBounds` - a table or a reference into one is out of range
    pub fn load(bytes: &[u8], options: &LoadOptions) -> ProgsResult<Program> {
        let header = Header::parse(bytes)?;
        if header.version != PROG_VERSION {
            return Err(ProgsError::format(format!(
                "version {} (expected {})",
                header.version, PROG_VERSION
            )));
        }
        if let Some(expected) = options.expected_crc {
            if header.crc != expected as i32 {
                return Err(ProgsError::ChecksumMismatch {
                    expected: expected as i32,
                    found: header.crc,
                });
            }
        }
        if header.entity_fields < 0 {
            return Err(ProgsError::format(format!(
                "negative entity field count {}",
                header.entity_fields
            )));
        }

        let statements = read_records(bytes, "statements", header.statements, STATEMENT_SIZE, |r| {
            Ok(Statement {
                op: r.read_u16::<LittleEndian>()?,
                a: r.read_i16::<LittleEndian>()?,
                b: r.read_i16::<LittleEndian>()?,
                c: r.read_i16::<LittleEndian>()?,
            })
        })?;
        let globaldefs = read_records(bytes, "globaldefs", header.globaldefs, DEF_SIZE, read_def)?;
        let fielddefs = read_records(bytes, "fielddefs", header.fielddefs, DEF_SIZE, read_def)?;
        let functions = read_records(bytes, "functions", header.functions, FUNCTION_SIZE, read_function)?;
        let strings = lump_bytes(bytes, "strings", header.strings, 1)?.to_vec();
        let globals = read_records(bytes, "globals", header.globals, 4, |r| {
            r.read_u32::<LittleEndian>()
        })?;

        let mut program = Program {
            header,
            statements,
            globaldefs,
            fielddefs,
            functions,
            strings,
            globals,
            entity_fields: header.entity_fields as usize,
            global_names: HashMap::new(),
            global_offsets: HashMap::new(),
            field_names: HashMap::new(),
            function_names: HashMap::new(),
        };
        program.validate()?;
        program.build_indices();

        info!(
            statements = program.statements.len(),
            functions = program.functions.len(),
            globals = program.globals.len(),
            entity_fields = program.entity_fields,
            "program loaded"
        );
        Ok(program)
    }

    /// Serialize to the binary image format
    ///
    /// Tables are laid out after the header in header order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body: Vec<u8> = Vec::new();
        let mut header = self.header;
        header.version = PROG_VERSION;
        header.entity_fields = self.entity_fields as i32;

        let place = |body: &mut Vec<u8>, count: usize, write: &dyn Fn(&mut Vec<u8>)| {
            let lump = Lump {
                offset: (HEADER_SIZE + body.len()) as i32,
                count: count as i32,
            };
            write(body);
            lump
        };

        header.statements = place(&mut body, self.statements.len(), &|out| {
            for st in &self.statements {
                out.extend_from_slice(&st.op.to_le_bytes());
                out.extend_from_slice(&st.a.to_le_bytes());
                out.extend_from_slice(&st.b.to_le_bytes());
                out.extend_from_slice(&st.c.to_le_bytes());
            }
        });
        header.globaldefs = place(&mut body, self.globaldefs.len(), &|out| {
            self.globaldefs.iter().for_each(|d| write_def(out, d));
        });
        header.fielddefs = place(&mut body, self.fielddefs.len(), &|out| {
            self.fielddefs.iter().for_each(|d| write_def(out, d));
        });
        header.functions = place(&mut body, self.functions.len(), &|out| {
            self.functions.iter().for_each(|f| write_function(out, f));
        });
        header.strings = place(&mut body, self.strings.len(), &|out| {
            out.extend_from_slice(&self.strings);
        });
        header.globals = place(&mut body, self.globals.len(), &|out| {
            for g in &self.globals {
                out.extend_from_slice(&g.to_le_bytes());
            }
        });

        let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len());
        // Writing into a Vec cannot fail.
        let _ = header.write(&mut bytes);
        bytes.extend_from_slice(&body);
        bytes
    }

    /// Build a program from tables assembled in memory
    pub(crate) fn from_tables(
        crc: i32,
        statements: Vec<Statement>,
        globaldefs: Vec<Def>,
        fielddefs: Vec<Def>,
        functions: Vec<Function>,
        strings: Vec<u8>,
        globals: Vec<u32>,
        entity_fields: usize,
    ) -> Program {
        let mut program = Program {
            header: Header {
                version: PROG_VERSION,
                crc,
                entity_fields: entity_fields as i32,
                ..Header::default()
            },
            statements,
            globaldefs,
            fielddefs,
            functions,
            strings,
            globals,
            entity_fields,
            global_names: HashMap::new(),
            global_offsets: HashMap::new(),
            field_names: HashMap::new(),
            function_names: HashMap::new(),
        };
        program.build_indices();
        program
    }

    pub(crate) fn validate(&self) -> ProgsResult<()> {
        let num_globals = self.globals.len();
        if num_globals < RESERVED_OFS {
            return Err(ProgsError::format(format!(
                "{} globals, the reserved region needs {}",
                num_globals, RESERVED_OFS
            )));
        }
        let strings_len = self.strings.len();
        let check_name = |table: &'static str, name: i32| -> ProgsResult<()> {
            if name == 0 || (name > 0 && (name as usize) < strings_len) {
                Ok(())
            } else {
                Err(ProgsError::TableBounds {
                    table,
                    offset: name as i64,
                    count: 1,
                    limit: strings_len as i64,
                })
            }
        };

        for def in &self.globaldefs {
            check_name("strings", def.name)?;
            let end = def.ofs as usize + def.width();
            if end > num_globals {
                return Err(ProgsError::TableBounds {
                    table: "globaldefs",
                    offset: def.ofs as i64,
                    count: def.width() as i64,
                    limit: num_globals as i64,
                });
            }
        }
        for def in &self.fielddefs {
            check_name("strings", def.name)?;
            let end = def.ofs as usize + def.width();
            if end > self.entity_fields {
                return Err(ProgsError::TableBounds {
                    table: "fielddefs",
                    offset: def.ofs as i64,
                    count: def.width() as i64,
                    limit: self.entity_fields as i64,
                });
            }
        }
        for (index, func) in self.functions.iter().enumerate() {
            check_name("strings", func.name)?;
            check_name("strings", func.file)?;
            if func.parm_size.iter().any(|w| !(1..=3).contains(w)) {
                return Err(ProgsError::format(format!(
                    "function {} has a parameter width outside 1..=3",
                    index
                )));
            }
            if let FunctionKind::Bytecode(first) = func.kind() {
                if first >= self.statements.len() {
                    return Err(ProgsError::TableBounds {
                        table: "statements",
                        offset: first as i64,
                        count: 1,
                        limit: self.statements.len() as i64,
                    });
                }
                let window_ok = func.parm_start >= 0
                    && func.locals >= 0
                    && (func.parm_start as usize + func.locals as usize) <= num_globals;
                if !window_ok {
                    return Err(ProgsError::TableBounds {
                        table: "globals",
                        offset: func.parm_start as i64,
                        count: func.locals as i64,
                        limit: num_globals as i64,
                    });
                }
                if func.parm_slots() > func.locals as usize {
                    return Err(ProgsError::format(format!(
                        "function {} has {} parameter slots but only {} locals",
                        index,
                        func.parm_slots(),
                        func.locals
                    )));
                }
            }
        }
        debug!("program tables validated");
        Ok(())
    }

    fn build_indices(&mut self) {
        for (i, def) in self.globaldefs.iter().enumerate() {
            let name = self.string_lossy(def.name).into_owned();
            if !name.is_empty() {
                self.global_names.entry(name).or_insert(i);
            }
            self.global_offsets.entry(def.ofs).or_insert(i);
        }
        for (i, def) in self.fielddefs.iter().enumerate() {
            let name = self.string_lossy(def.name).into_owned();
            if !name.is_empty() {
                self.field_names.entry(name).or_insert(i);
            }
        }
        for (i, func) in self.functions.iter().enumerate() {
            let name = self.string_lossy(func.name).into_owned();
            if !name.is_empty() {
                self.function_names.entry(name).or_insert(i);
            }
        }
    }

    /// Bytes of the static string at `ofs`, without the terminator
    pub fn string_bytes(&self, ofs: i32) -> Option<&[u8]> {
        if ofs < 0 {
            return None;
        }
        let start = ofs as usize;
        if start >= self.strings.len() {
            return if start == 0 { Some(&[][..]) } else { None };
        }
        let tail = &self.strings[start..];
        let end = tail.iter().position(|b| *b == 0).unwrap_or(tail.len());
        Some(&tail[..end])
    }

    /// Static string at `ofs`, lossily decoded; empty when out of range
    pub fn string_lossy(&self, ofs: i32) -> Cow<'_, str> {
        self.string_bytes(ofs)
            .map(String::from_utf8_lossy)
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Index of the function with the given name
    pub fn find_function(&self, name: &str) -> Option<usize> {
        self.function_names.get(name).copied()
    }

    /// Global definition with the given name
    pub fn find_global(&self, name: &str) -> Option<&Def> {
        self.global_names.get(name).map(|i| &self.globaldefs[*i])
    }

    /// Field definition with the given name
    pub fn find_field(&self, name: &str) -> Option<&Def> {
        self.field_names.get(name).map(|i| &self.fielddefs[*i])
    }

    /// Global definition starting at a slot
    pub fn global_at(&self, ofs: u16) -> Option<&Def> {
        self.global_offsets.get(&ofs).map(|i| &self.globaldefs[*i])
    }

    /// Name of a function, empty for out-of-range indices
    pub fn function_name(&self, index: usize) -> Cow<'_, str> {
        self.functions
            .get(index)
            .map(|f| self.string_lossy(f.name))
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Source file of a function
    pub fn function_file(&self, index: usize) -> Cow<'_, str> {
        self.functions
            .get(index)
            .map(|f| self.string_lossy(f.file))
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Function whose body contains the given statement
    pub fn function_containing(&self, statement: usize) -> Option<usize> {
        self.functions
            .iter()
            .enumerate()
            .filter_map(|(i, f)| match f.kind() {
                FunctionKind::Bytecode(first) if first <= statement => Some((i, first)),
                _ => None,
            })
            .max_by_key(|(_, first)| *first)
            .map(|(i, _)| i)
    }
}

fn truncated(err: std::io::Error) -> ProgsError {
    ProgsError::format(format!("truncated record: {}", err))
}

fn lump_bytes<'a>(
    bytes: &'a [u8],
    table: &'static str,
    lump: Lump,
    record: usize,
) -> ProgsResult<&'a [u8]> {
    let out_of_bounds = || ProgsError::TableBounds {
        table,
        offset: lump.offset as i64,
        count: lump.count as i64,
        limit: bytes.len() as i64,
    };
    if lump.offset < 0 || lump.count < 0 {
        return Err(out_of_bounds());
    }
    let start = lump.offset as usize;
    let len = (lump.count as usize)
        .checked_mul(record)
        .ok_or_else(out_of_bounds)?;
    let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
    bytes.get(start..end).ok_or_else(out_of_bounds)
}

fn read_records<T>(
    bytes: &[u8],
    table: &'static str,
    lump: Lump,
    record: usize,
    mut parse: impl FnMut(&mut Cursor<&[u8]>) -> std::io::Result<T>,
) -> ProgsResult<Vec<T>> {
    let data = lump_bytes(bytes, table, lump, record)?;
    let mut reader = Cursor::new(data);
    let mut out = Vec::with_capacity(lump.count as usize);
    for _ in 0..lump.count {
        out.push(parse(&mut reader).map_err(truncated)?);
    }
    Ok(out)
}

fn read_def(r: &mut Cursor<&[u8]>) -> std::io::Result<Def> {
    Ok(Def {
        type_tag: r.read_u16::<LittleEndian>()?,
        ofs: r.read_u16::<LittleEndian>()?,
        name: r.read_i32::<LittleEndian>()?,
    })
}

fn read_function(r: &mut Cursor<&[u8]>) -> std::io::Result<Function> {
    let first_statement = r.read_i32::<LittleEndian>()?;
    let parm_start = r.read_i32::<LittleEndian>()?;
    let locals = r.read_i32::<LittleEndian>()?;
    let profile = r.read_i32::<LittleEndian>()?;
    let name = r.read_i32::<LittleEndian>()?;
    let file = r.read_i32::<LittleEndian>()?;
    let num_parms = r.read_i32::<LittleEndian>()?;
    let mut sizes = [0u8; MAX_PARMS];
    r.read_exact(&mut sizes)?;

    // Variadic functions store -1 - (fixed parameter count).
    let fixed = if num_parms < 0 { -(num_parms + 1) } else { num_parms } as usize;
    if fixed > MAX_PARMS {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{} parameters (max {})", num_parms, MAX_PARMS),
        ));
    }
    Ok(Function {
        first_statement,
        parm_start,
        locals,
        profile,
        name,
        file,
        parm_size: sizes[..fixed].iter().copied().collect(),
        variadic: num_parms < 0,
    })
}

fn write_def(out: &mut Vec<u8>, def: &Def) {
    out.extend_from_slice(&def.type_tag.to_le_bytes());
    out.extend_from_slice(&def.ofs.to_le_bytes());
    out.extend_from_slice(&def.name.to_le_bytes());
}

fn write_function(out: &mut Vec<u8>, func: &Function) {
    let fixed = func.parm_size.len() as i32;
    let num_parms = if func.variadic { -1 - fixed } else { fixed };
    for v in [
        func.first_statement,
        func.parm_start,
        func.locals,
        func.profile,
        func.name,
        func.file,
        num_parms,
    ] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    let mut sizes: ArrayVec<u8, MAX_PARMS> = func.parm_size.clone();
    while !sizes.is_full() {
        sizes.push(0);
    }
    out.extend_from_slice(&sizes);
}
