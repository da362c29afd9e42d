// ==========================================
// E-Claim 对账核心 - 字段映射表
// ==========================================
// 职责: 五种报表模式变体的静态映射表 + 附加工作表映射表
// 约定:
//   - 列定义集中在 cols 模块，同名列在所有变体中类型一致
//   - 按列序寻址的表: 列表位置即源列号（SKIP 占位）
//   - SSS 按表头名寻址
// ==========================================

use crate::domain::types::SchemaVariant;
use std::collections::HashSet;
use std::sync::OnceLock;

// ==========================================
// 字段类型 (Field Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Skip,
    Text(usize),       // 超长截断
    Identifier(usize), // 去掉尾部 ".0" 后截断
    Date,
    DateTime,
    Amount,
    Integer,
}

impl FieldKind {
    /// SQLite 列类型
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldKind::Skip => "TEXT",
            FieldKind::Text(_) | FieldKind::Identifier(_) => "TEXT",
            FieldKind::Date | FieldKind::DateTime => "TEXT",
            FieldKind::Amount => "REAL",
            FieldKind::Integer => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn col(name: &'static str, kind: FieldKind) -> Column {
    Column { name, kind }
}

/// 占位列（源文件中存在但不入库）
pub const SKIP: Column = col("", FieldKind::Skip);

// ==========================================
// 来源寻址
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Index(usize),
    Header(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub column: Column,
    pub source: Source,
}

// ==========================================
// 表头定位策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStrategy {
    /// 数据从固定行开始（0 基）
    Fixed { data_start_row: usize },
    /// 前 N 行中关键字扫描，失败回退默认行
    KeywordScan,
}

/// 表头关键字（精确匹配，大小写不敏感）
pub const HEADER_KEYWORDS: &[&str] = &[
    "rep no.",
    "rep",
    "tran_id",
    "hn",
    "an",
    "pid",
    "ชื่อ-สกุล",
    "ชื่อ - สกุล",
    "ประเภทผู้ป่วย",
    "วันเข้ารักษา",
    "วันจำหน่าย",
    "ชดเชยสุทธิ",
    "error code",
];

/// 主键列
pub const KEY_COLUMN: &str = "tran_id";

// ==========================================
// 列定义
// ==========================================
pub mod cols {
    use super::{col, Column, FieldKind::*};

    // ----- 身份与患者 -----
    pub const REP_NO: Column = col("rep_no", Identifier(15));
    pub const ROW_SEQ: Column = col("row_seq", Integer);
    pub const TRAN_ID: Column = col("tran_id", Identifier(15));
    pub const HN: Column = col("hn", Identifier(15));
    pub const AN: Column = col("an", Identifier(15));
    pub const PID: Column = col("pid", Identifier(20));
    pub const PATIENT_NAME: Column = col("patient_name", Text(100));
    pub const PATIENT_TYPE: Column = col("patient_type", Text(10));
    pub const ADMISSION_DATE: Column = col("admission_date", DateTime);
    pub const DISCHARGE_DATE: Column = col("discharge_date", DateTime);
    pub const REIMBURSEMENT_TOTAL: Column = col("reimbursement_total", Amount);
    pub const REIMBURSE_SOURCE: Column = col("reimburse_source", Text(50));
    pub const ERROR_CODE: Column = col("error_code", Text(100));

    // ----- 基金与权利 -----
    pub const MAIN_FUND: Column = col("main_fund", Text(100));
    pub const SUB_FUND: Column = col("sub_fund", Text(100));
    pub const SERVICE_TYPE: Column = col("service_type", Text(10));
    pub const REFER_FLAG: Column = col("refer_flag", Text(10));
    pub const RIGHT_FLAG: Column = col("right_flag", Text(10));
    pub const USE_RIGHT: Column = col("use_right", Text(10));
    pub const CHK: Column = col("chk", Text(10));
    pub const MAIN_INSCL: Column = col("main_inscl", Text(10));
    pub const SUB_INSCL: Column = col("sub_inscl", Text(10));

    // ----- 医院编码 -----
    pub const HREF: Column = col("href", Identifier(10));
    pub const HCODE: Column = col("hcode", Identifier(10));
    pub const HMAIN: Column = col("hmain", Identifier(10));
    pub const PROV1: Column = col("prov1", Identifier(10));
    pub const RG1: Column = col("rg1", Identifier(10));
    pub const HMAIN2: Column = col("hmain2", Identifier(10));
    pub const PROV2: Column = col("prov2", Identifier(10));
    pub const RG2: Column = col("rg2", Identifier(10));
    pub const HMAIN3: Column = col("hmain3", Identifier(10));
    pub const DA: Column = col("da", Text(10));
    pub const PROJCODE: Column = col("projcode", Text(100));
    pub const PA: Column = col("pa", Text(10));
    pub const ORG_CODE: Column = col("org_code", Identifier(10));
    pub const EMPLOYER_CODE: Column = col("employer_code", Identifier(20));
    pub const REFER_NO: Column = col("refer_no", Identifier(30));
    pub const PDX: Column = col("pdx", Text(20));

    // ----- 住院 DRG 区块 -----
    pub const DRG: Column = col("drg", Text(10));
    pub const RW: Column = col("rw", Amount);
    pub const CA_TYPE: Column = col("ca_type", Text(10));
    pub const ADJRW_NHSO: Column = col("adjrw_nhso", Amount);
    pub const ADJRW2: Column = col("adjrw2", Amount);
    pub const PAY_RATE: Column = col("pay_rate", Amount);
    pub const PS: Column = col("ps", Amount);
    pub const PS_PERCENT: Column = col("ps_percent", Amount);
    pub const CCUF: Column = col("ccuf", Amount);
    pub const ADJRW_AFTER_PS: Column = col("adjrw_after_ps", Amount);
    pub const LOS: Column = col("los", Integer);
    pub const LEAVE_DAYS: Column = col("leave_days", Integer);

    // ----- 金额汇总 -----
    pub const CLAIM_NET: Column = col("claim_net", Amount);
    pub const CLAIM_CENTRAL_REIMB: Column = col("claim_central_reimb", Amount);
    pub const PAID: Column = col("paid", Amount);

    // ----- 各基金 申请/支付 -----
    pub const HC_CLAIM: Column = col("hc_claim", Amount);
    pub const HC_PAID: Column = col("hc_paid", Amount);
    pub const AE_CLAIM: Column = col("ae_claim", Amount);
    pub const AE_PAID: Column = col("ae_paid", Amount);
    pub const INST_CLAIM: Column = col("inst_claim", Amount);
    pub const INST_PAID: Column = col("inst_paid", Amount);
    pub const IP_CLAIM: Column = col("ip_claim", Amount);
    pub const IP_PAID: Column = col("ip_paid", Amount);
    pub const DMIS_CATARACT_CLAIM: Column = col("dmis_cataract_claim", Amount);
    pub const DMIS_CATARACT_PAID: Column = col("dmis_cataract_paid", Amount);
    pub const DMIS_KNEE_CLAIM: Column = col("dmis_knee_claim", Amount);
    pub const DMIS_KNEE_PAID: Column = col("dmis_knee_paid", Amount);
    pub const DMIS_RT_CLAIM: Column = col("dmis_rt_claim", Amount);
    pub const DMIS_RT_PAID: Column = col("dmis_rt_paid", Amount);
    pub const DMIS_STROKE_CLAIM: Column = col("dmis_stroke_claim", Amount);
    pub const DMIS_STROKE_PAID: Column = col("dmis_stroke_paid", Amount);
    pub const DMIS_QI_CLAIM: Column = col("dmis_qi_claim", Amount);
    pub const DMIS_QI_PAID: Column = col("dmis_qi_paid", Amount);
    pub const DRUG_CLAIM: Column = col("drug_claim", Amount);
    pub const DRUG_PAID: Column = col("drug_paid", Amount);
    pub const OP_BKK_CLAIM: Column = col("op_bkk_claim", Amount);
    pub const OP_BKK_PAID: Column = col("op_bkk_paid", Amount);
    pub const OP_REMOTE_CLAIM: Column = col("op_remote_claim", Amount);
    pub const OP_REMOTE_PAID: Column = col("op_remote_paid", Amount);
    pub const PP_CLAIM: Column = col("pp_claim", Amount);
    pub const PP_PAID: Column = col("pp_paid", Amount);
    pub const PPA_CLAIM: Column = col("ppa_claim", Amount);
    pub const PPA_PAID: Column = col("ppa_paid", Amount);
    pub const PALLIATIVE_CLAIM: Column = col("palliative_claim", Amount);
    pub const PALLIATIVE_PAID: Column = col("palliative_paid", Amount);
    pub const TELEMED_CLAIM: Column = col("telemed_claim", Amount);
    pub const TELEMED_PAID: Column = col("telemed_paid", Amount);

    // ----- 拒付 -----
    pub const DENY_HC: Column = col("deny_hc", Text(100));
    pub const DENY_AE: Column = col("deny_ae", Text(100));
    pub const DENY_INST: Column = col("deny_inst", Text(100));
    pub const DENY_IP: Column = col("deny_ip", Text(100));
    pub const DENY_DMIS: Column = col("deny_dmis", Text(100));
    pub const DENY_DRUG: Column = col("deny_drug", Text(100));
    pub const DENY_PP: Column = col("deny_pp", Text(100));
    pub const DENY_OTHER: Column = col("deny_other", Text(100));

    // ----- 其他 -----
    pub const BASE_RATE: Column = col("base_rate", Amount);
    pub const FS_TOTAL: Column = col("fs_total", Amount);
    pub const VA: Column = col("va", Amount);
    pub const REIMB_BALANCE: Column = col("reimb_balance", Amount);
    pub const REMARK: Column = col("remark", Text(500));
    pub const AUDIT_RESULTS: Column = col("audit_results", Text(500));
    pub const PAYMENT_FORMAT: Column = col("payment_format", Text(50));
    pub const SEQ_NO: Column = col("seq_no", Identifier(30));
    pub const INVOICE_NO: Column = col("invoice_no", Identifier(30));
    pub const INVOICE_LT: Column = col("invoice_lt", Identifier(30));
    pub const PAY_DATE: Column = col("pay_date", Date);

    // ----- 附加工作表 -----
    pub const FUND: Column = col("fund", Text(100));
    pub const ITEM_CODE: Column = col("item_code", Identifier(30));
    pub const ITEM_NAME: Column = col("item_name", Text(255));
    pub const QUANTITY: Column = col("quantity", Amount);
    pub const UNIT_PRICE: Column = col("unit_price", Amount);
    pub const CLAIM_AMOUNT: Column = col("claim_amount", Amount);
    pub const PAID_AMOUNT: Column = col("paid_amount", Amount);
    pub const DENY_AMOUNT: Column = col("deny_amount", Amount);
    pub const DENY_CODE: Column = col("deny_code", Text(100));
    pub const DENY_REASON: Column = col("deny_reason", Text(500));
    pub const CASE_COUNT: Column = col("case_count", Integer);
}

use cols::*;

// ==========================================
// UCS 主表布局（按列序）
// ==========================================
// 前 34 列 OP/IP 共用；IP 在其后多出 DRG 区块
const UCS_HEAD: &[Column] = &[
    REP_NO,
    ROW_SEQ,
    TRAN_ID,
    HN,
    AN,
    PID,
    PATIENT_NAME,
    PATIENT_TYPE,
    ADMISSION_DATE,
    DISCHARGE_DATE,
    REIMBURSEMENT_TOTAL,
    REIMBURSE_SOURCE,
    ERROR_CODE,
    MAIN_FUND,
    SUB_FUND,
    SERVICE_TYPE,
    REFER_FLAG,
    RIGHT_FLAG,
    USE_RIGHT,
    CHK,
    MAIN_INSCL,
    SUB_INSCL,
    HREF,
    HCODE,
    HMAIN,
    PROV1,
    RG1,
    HMAIN2,
    PROV2,
    RG2,
    HMAIN3,
    DA,
    PROJCODE,
    PA,
];

const UCS_IP_BLOCK: &[Column] = &[
    DRG,
    RW,
    CA_TYPE,
    ADJRW_NHSO,
    ADJRW2,
    PAY_RATE,
    PS,
    PS_PERCENT,
    CCUF,
    ADJRW_AFTER_PS,
    LOS,
    LEAVE_DAYS,
];

const UCS_TAIL: &[Column] = &[
    CLAIM_NET,
    CLAIM_CENTRAL_REIMB,
    PAID,
    HC_CLAIM,
    HC_PAID,
    AE_CLAIM,
    AE_PAID,
    INST_CLAIM,
    INST_PAID,
    IP_CLAIM,
    IP_PAID,
    DMIS_CATARACT_CLAIM,
    DMIS_CATARACT_PAID,
    DMIS_KNEE_CLAIM,
    DMIS_KNEE_PAID,
    DMIS_RT_CLAIM,
    DMIS_RT_PAID,
    DMIS_STROKE_CLAIM,
    DMIS_STROKE_PAID,
    DMIS_QI_CLAIM,
    DMIS_QI_PAID,
    DRUG_CLAIM,
    DRUG_PAID,
    OP_BKK_CLAIM,
    OP_BKK_PAID,
    OP_REMOTE_CLAIM,
    OP_REMOTE_PAID,
    PP_CLAIM,
    PP_PAID,
    PPA_CLAIM,
    PPA_PAID,
    PALLIATIVE_CLAIM,
    PALLIATIVE_PAID,
    TELEMED_CLAIM,
    TELEMED_PAID,
    DENY_HC,
    DENY_AE,
    DENY_INST,
    DENY_IP,
    DENY_DMIS,
    DENY_DRUG,
    DENY_PP,
    DENY_OTHER,
    BASE_RATE,
    FS_TOTAL,
    VA,
    REIMB_BALANCE,
    REMARK,
    AUDIT_RESULTS,
    PAYMENT_FORMAT,
    SEQ_NO,
    INVOICE_NO,
    INVOICE_LT,
    PAY_DATE,
];

// ==========================================
// ORF 转诊门诊（三级合并表头，数据从第 10 行开始）
// ==========================================
const ORF_LAYOUT: &[Column] = &[
    REP_NO,
    ROW_SEQ,
    TRAN_ID,
    HN,
    PID,
    PATIENT_NAME,
    ADMISSION_DATE,
    SKIP, // 就诊时段
    HREF,
    HCODE,
    REFER_NO,
    PDX,
    ERROR_CODE,
    CLAIM_NET,
    OP_REMOTE_CLAIM,
    OP_REMOTE_PAID,
    PAID,
    REIMBURSEMENT_TOTAL,
    DENY_OTHER,
    REMARK,
    AUDIT_RESULTS,
    SEQ_NO,
    INVOICE_NO,
];

// ==========================================
// LGO 地方政府（数据从第 8 行开始）
// ==========================================
const LGO_LAYOUT: &[Column] = &[
    REP_NO,
    ROW_SEQ,
    TRAN_ID,
    HN,
    AN,
    PID,
    PATIENT_NAME,
    PATIENT_TYPE,
    ADMISSION_DATE,
    DISCHARGE_DATE,
    REIMBURSEMENT_TOTAL,
    ERROR_CODE,
    MAIN_INSCL,
    ORG_CODE,
    DRG,
    RW,
    ADJRW_NHSO,
    CLAIM_NET,
    PAID,
    SKIP, // 空白分隔列
    DENY_OTHER,
    REMARK,
    AUDIT_RESULTS,
    SEQ_NO,
    INVOICE_NO,
];

// ==========================================
// SSS 社保（按表头名）
// ==========================================
const SSS_HEADERS: &[(&str, Column)] = &[
    ("REP No.", REP_NO),
    ("ลำดับ", ROW_SEQ),
    ("TRAN_ID", TRAN_ID),
    ("HN", HN),
    ("AN", AN),
    ("PID", PID),
    ("ชื่อ-สกุล", PATIENT_NAME),
    ("ประเภทผู้ป่วย", PATIENT_TYPE),
    ("วันเข้ารักษา", ADMISSION_DATE),
    ("วันจำหน่าย", DISCHARGE_DATE),
    ("ชดเชยสุทธิ", REIMBURSEMENT_TOTAL),
    ("Error Code", ERROR_CODE),
    ("HCODE", HCODE),
    ("HMAIN", HMAIN),
    ("รหัสสถานประกอบการ", EMPLOYER_CODE),
    ("DRG", DRG),
    ("RW", RW),
    ("ADJRW", ADJRW_NHSO),
    ("เรียกเก็บ", CLAIM_NET),
    ("ชดเชย", PAID),
    ("หมายเหตุ", REMARK),
    ("ผลตรวจ", AUDIT_RESULTS),
    ("เลขที่ใบแจ้งหนี้", INVOICE_NO),
];

// ==========================================
// VariantSchema - 变体映射表
// ==========================================
#[derive(Debug)]
pub struct VariantSchema {
    pub variant: SchemaVariant,
    pub header: HeaderStrategy,
    pub fields: Vec<FieldSpec>,
}

impl VariantSchema {
    pub fn key_field(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.column.name == KEY_COLUMN)
    }

    /// 是否按表头名寻址
    pub fn uses_header_names(&self) -> bool {
        self.fields
            .iter()
            .any(|f| matches!(f.source, Source::Header(_)))
    }
}

/// 按列序展开（SKIP 占位但不产出字段）
fn positional(segments: &[&[Column]]) -> Vec<FieldSpec> {
    segments
        .iter()
        .flat_map(|seg| seg.iter())
        .enumerate()
        .filter(|(_, c)| c.kind != FieldKind::Skip)
        .map(|(idx, c)| FieldSpec {
            column: *c,
            source: Source::Index(idx),
        })
        .collect()
}

fn by_header(headers: &[(&'static str, Column)]) -> Vec<FieldSpec> {
    headers
        .iter()
        .map(|(h, c)| FieldSpec {
            column: *c,
            source: Source::Header(*h),
        })
        .collect()
}

/// 取变体映射表（进程内只构建一次）
pub fn schema_for(variant: SchemaVariant) -> &'static VariantSchema {
    static UCS_OP: OnceLock<VariantSchema> = OnceLock::new();
    static UCS_IP: OnceLock<VariantSchema> = OnceLock::new();
    static ORF: OnceLock<VariantSchema> = OnceLock::new();
    static LGO: OnceLock<VariantSchema> = OnceLock::new();
    static SSS: OnceLock<VariantSchema> = OnceLock::new();

    match variant {
        SchemaVariant::UcsOp => UCS_OP.get_or_init(|| VariantSchema {
            variant,
            header: HeaderStrategy::KeywordScan,
            fields: positional(&[UCS_HEAD, UCS_TAIL]),
        }),
        SchemaVariant::UcsIp => UCS_IP.get_or_init(|| VariantSchema {
            variant,
            header: HeaderStrategy::KeywordScan,
            fields: positional(&[UCS_HEAD, UCS_IP_BLOCK, UCS_TAIL]),
        }),
        SchemaVariant::Orf => ORF.get_or_init(|| VariantSchema {
            variant,
            header: HeaderStrategy::Fixed { data_start_row: 10 },
            fields: positional(&[ORF_LAYOUT]),
        }),
        SchemaVariant::Lgo => LGO.get_or_init(|| VariantSchema {
            variant,
            header: HeaderStrategy::Fixed { data_start_row: 8 },
            fields: positional(&[LGO_LAYOUT]),
        }),
        SchemaVariant::Sss => SSS.get_or_init(|| VariantSchema {
            variant,
            header: HeaderStrategy::KeywordScan,
            fields: by_header(SSS_HEADERS),
        }),
    }
}

/// claim_rep 的全部数据列（各变体并集，按首次出现顺序）
pub fn claim_columns() -> &'static [Column] {
    static COLUMNS: OnceLock<Vec<Column>> = OnceLock::new();
    COLUMNS.get_or_init(|| {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for variant in SchemaVariant::ALL {
            for field in &schema_for(variant).fields {
                if seen.insert(field.column.name) {
                    out.push(field.column);
                }
            }
        }
        out
    })
}

// ==========================================
// 附加工作表
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxSheetKind {
    Drug,
    Instrument,
    Deny,
    ZeroPaid,
    Summary,
}

impl AuxSheetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuxSheetKind::Drug => "drug",
            AuxSheetKind::Instrument => "instrument",
            AuxSheetKind::Deny => "deny",
            AuxSheetKind::ZeroPaid => "zero_paid",
            AuxSheetKind::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AuxSheetSpec {
    pub kind: AuxSheetKind,
    pub table: &'static str,
    pub sheet_keywords: &'static [&'static str],
    pub data_start_row: usize,
    pub key_column: &'static str,
    pub layout: &'static [Column],
}

impl AuxSheetSpec {
    pub fn fields(&self) -> Vec<FieldSpec> {
        positional(&[self.layout])
    }

    /// 去掉占位后的入库列
    pub fn columns(&self) -> Vec<Column> {
        self.layout
            .iter()
            .filter(|c| c.kind != FieldKind::Skip)
            .copied()
            .collect()
    }
}

pub const AUX_DRUG: AuxSheetSpec = AuxSheetSpec {
    kind: AuxSheetKind::Drug,
    table: "claim_rep_drug",
    sheet_keywords: &["drug", "ยา"],
    data_start_row: 5,
    key_column: "tran_id",
    layout: &[
        TRAN_ID, HN, PID, ITEM_CODE, ITEM_NAME, QUANTITY, UNIT_PRICE, CLAIM_AMOUNT, PAID_AMOUNT,
        DENY_CODE,
    ],
};

pub const AUX_INSTRUMENT: AuxSheetSpec = AuxSheetSpec {
    kind: AuxSheetKind::Instrument,
    table: "claim_rep_instrument",
    sheet_keywords: &["inst", "อวัยวะเทียม"],
    data_start_row: 5,
    key_column: "tran_id",
    layout: &[
        TRAN_ID, HN, PID, ITEM_CODE, ITEM_NAME, QUANTITY, UNIT_PRICE, CLAIM_AMOUNT, PAID_AMOUNT,
        DENY_CODE,
    ],
};

pub const AUX_DENY: AuxSheetSpec = AuxSheetSpec {
    kind: AuxSheetKind::Deny,
    table: "claim_rep_deny",
    sheet_keywords: &["deny", "ปฏิเสธ"],
    data_start_row: 5,
    key_column: "tran_id",
    layout: &[TRAN_ID, HN, PID, FUND, DENY_CODE, DENY_REASON, CLAIM_AMOUNT],
};

pub const AUX_ZERO_PAID: AuxSheetSpec = AuxSheetSpec {
    kind: AuxSheetKind::ZeroPaid,
    table: "claim_rep_zero_paid",
    sheet_keywords: &["zero", "0 บาท"],
    data_start_row: 5,
    key_column: "tran_id",
    layout: &[TRAN_ID, HN, PID, FUND, CLAIM_AMOUNT, DENY_REASON],
};

pub const AUX_SUMMARY: AuxSheetSpec = AuxSheetSpec {
    kind: AuxSheetKind::Summary,
    table: "claim_rep_summary",
    sheet_keywords: &["summary", "สรุป"],
    data_start_row: 4,
    key_column: "fund",
    layout: &[FUND, CASE_COUNT, CLAIM_AMOUNT, PAID_AMOUNT, DENY_AMOUNT],
};

pub const ALL_AUX_SHEETS: &[AuxSheetSpec] =
    &[AUX_DRUG, AUX_INSTRUMENT, AUX_DENY, AUX_ZERO_PAID, AUX_SUMMARY];

/// 变体附带的附加工作表
pub fn aux_sheets_for(variant: SchemaVariant) -> &'static [AuxSheetSpec] {
    const SSS_AUX: &[AuxSheetSpec] = &[AUX_DENY, AUX_SUMMARY];
    match variant {
        SchemaVariant::UcsOp | SchemaVariant::UcsIp => ALL_AUX_SHEETS,
        SchemaVariant::Sss => SSS_AUX,
        SchemaVariant::Orf | SchemaVariant::Lgo => &[],
    }
}
