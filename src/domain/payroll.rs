use super::attendance::STANDARD_SHIFT_HOURS;
use super::time::round2;

/// Divisor turning a monthly basic salary into a daily one.
pub const PAYROLL_MONTH_DAYS: f64 = 30.0;

/// Overtime is paid at this multiple of the hourly rate.
pub const OVERTIME_MULTIPLIER: f64 = 1.5;

/// Flat income tax rate applied to total earnings.
pub const TAX_RATE: f64 = 0.10;

/// Provident fund contribution as a share of the basic salary.
pub const PROVIDENT_FUND_RATE: f64 = 0.12;

/// Period facts a statement is derived from.
#[derive(Debug, Clone, Copy)]
pub struct PayrollInputs {
    pub basic_salary: f64,
    pub present_days: i64,
    pub leave_days: i64,
    pub overtime_hours: f64,
}

/// Fully reconciled earnings/deductions breakdown. Every amount is already
/// rounded to two decimals, and `net_salary` is derived from the rounded
/// `total_earnings`/`total_deductions` so the stored invariant holds exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollBreakdown {
    pub basic_salary: f64,
    pub allowances: f64,
    pub bonuses: f64,
    pub overtime_pay: f64,
    pub total_earnings: f64,
    pub tax: f64,
    pub provident_fund: f64,
    pub insurance: f64,
    pub leave_deductions: f64,
    pub other_deductions: f64,
    pub total_deductions: f64,
    pub net_salary: f64,
}

/// Apply the compensation policy to one employee-month.
pub fn compute(inputs: &PayrollInputs) -> PayrollBreakdown {
    let daily_salary = inputs.basic_salary / PAYROLL_MONTH_DAYS;

    let earned_salary = round2(daily_salary * inputs.present_days as f64);
    let allowances = 0.0;
    let bonuses = 0.0;
    let overtime_pay = round2(
        inputs.overtime_hours * (daily_salary / STANDARD_SHIFT_HOURS) * OVERTIME_MULTIPLIER,
    );
    let total_earnings = round2(earned_salary + allowances + bonuses + overtime_pay);

    let tax = round2(total_earnings * TAX_RATE);
    let provident_fund = round2(inputs.basic_salary * PROVIDENT_FUND_RATE);
    let insurance = 0.0;
    let leave_deductions = round2(daily_salary * inputs.leave_days as f64);
    let other_deductions = 0.0;
    let total_deductions =
        round2(tax + provident_fund + insurance + leave_deductions + other_deductions);

    let net_salary = round2(total_earnings - total_deductions);

    PayrollBreakdown {
        basic_salary: inputs.basic_salary,
        allowances,
        bonuses,
        overtime_pay,
        total_earnings,
        tax,
        provident_fund,
        insurance,
        leave_deductions,
        other_deductions,
        total_deductions,
        net_salary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_month_breakdown() {
        // 3000 basic, 20 present days, 2 leave days, 5 overtime hours
        let breakdown = compute(&PayrollInputs {
            basic_salary: 3000.0,
            present_days: 20,
            leave_days: 2,
            overtime_hours: 5.0,
        });

        // daily salary 100; 5h overtime at (100/8) * 1.5
        assert_eq!(breakdown.overtime_pay, 93.75);
        assert_eq!(breakdown.total_earnings, 2093.75);
        assert_eq!(breakdown.tax, 209.38);
        assert_eq!(breakdown.provident_fund, 360.0);
        assert_eq!(breakdown.leave_deductions, 200.0);
        assert_eq!(breakdown.total_deductions, 769.38);
        assert_eq!(breakdown.net_salary, 1324.37);
    }

    #[test]
    fn no_attendance_earns_nothing() {
        let breakdown = compute(&PayrollInputs {
            basic_salary: 3000.0,
            present_days: 0,
            leave_days: 0,
            overtime_hours: 0.0,
        });

        assert_eq!(breakdown.total_earnings, 0.0);
        assert_eq!(breakdown.tax, 0.0);
        // provident fund is still withheld against the basic salary
        assert_eq!(breakdown.provident_fund, 360.0);
        assert_eq!(breakdown.net_salary, -360.0);
    }

    #[test]
    fn net_salary_matches_totals_exactly() {
        for (basic, present, leave, overtime) in [
            (2500.0, 22, 1, 3.5),
            (4321.0, 18, 4, 0.0),
            (999.99, 30, 0, 12.25),
        ] {
            let b = compute(&PayrollInputs {
                basic_salary: basic,
                present_days: present,
                leave_days: leave,
                overtime_hours: overtime,
            });
            assert_eq!(b.net_salary, round2(b.total_earnings - b.total_deductions));
            assert_eq!(
                b.total_deductions,
                round2(b.tax + b.provident_fund + b.insurance + b.leave_deductions + b.other_deductions)
            );
        }
    }
}
